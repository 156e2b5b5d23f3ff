//! # deployvisor
//!
//! **Deployvisor** is the core of a deployment controller: it decides what
//! happens after a reconciliation attempt fails, paces retries with a shared
//! token bucket, and resolves which container image and environment a
//! deployer pod runs for a given strategy.
//!
//! Talking to a real cluster is out of scope. Records come in through a
//! [`WatchFeed`] or [`ControllerHandle::enqueue`]; the reconciliation body
//! ([`Reconcile`]) talks to a [`ResourceStore`]; operator-facing warnings go to
//! an [`EventSink`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────┐      ┌──────────────────┐
//!   │  WatchFeed   │      │ ControllerHandle │
//!   │  (changes)   │      │    ::enqueue     │
//!   └──────┬───────┘      └────────┬─────────┘
//!          ▼                       ▼
//! ┌──────────────────────────────────────────────┐
//! │ ReconcileQueue (FIFO, one record per key)    │◄──────────────┐
//! └──────────────────────┬───────────────────────┘               │
//!                        ▼ pop                                   │ enqueue_if_absent
//! ┌──────────────────────────────────────────────┐               │
//! │ ControlLoop                                  │               │
//! │  └─► Reconcile::reconcile(record)            │               │
//! │        ├─ Ok  ─► forget retry state          │               │
//! │        └─ Err ─► RetryManager                │               │
//! └──────────────────────┬───────────────────────┘               │
//!                        ▼                                       │
//! ┌──────────────────────────────────────────────┐   ┌───────────┴──────────┐
//! │ RetryPolicy::should_retry(record, err, state)│──►│ RateLimiter (bucket) │
//! │  ├─ Fatal           ─► abandon               │   └──────────────────────┘
//! │  ├─ count > 1       ─► abandon               │
//! │  │   └─ Actionable  ─► EventSink FailedRetry │
//! │  └─ otherwise       ─► retry                 │
//! └──────────────────────────────────────────────┘
//!
//! Every stage publishes Events ──► Bus ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ### Deployer resolution
//! ```text
//! StrategyDescriptor ──► resolve(deployer_image, base_env, strategy)
//!   ├─ Recreate / Rolling ─► { deployer_image, base_env }
//!   └─ Custom(params)     ─► { params.image, base_env ++ params.environment }
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                                  |
//! |-------------------|------------------------------------------------------------|-----------------------------------------------------|
//! | **Runtime**       | Queue, control loop, graceful shutdown                     | [`Controller`], [`ControlLoop`], [`ReconcileQueue`] |
//! | **Policies**      | Error classification, retry ceiling, requeue pacing        | [`classify`], [`RetryPolicy`], [`RateLimiter`]      |
//! | **Deployment**    | Strategy model and deployer container resolution           | [`StrategyDescriptor`], [`resolve`], [`Pod`]        |
//! | **Store**         | Capability set for reconciliation bodies                   | [`ResourceStore`], [`MemoryStore`]                  |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom)        | [`Subscribe`], [`Event`]                            |
//! | **Errors**        | Typed errors; the variant decides the retry class          | [`ReconcileError`], [`ErrorClass`]                  |
//! | **Configuration** | Deployer image, environment, rate limit, grace period      | [`Config`]                                          |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use deployvisor::{
//!     Config, Controller, DeploymentRecord, MemoryStore, ObjectKey, ReconcileError,
//!     ReconcileFn, ResourceStore, StaticFeed, StrategyDescriptor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::new("registry.local/deployer:v1");
//!     cfg.service_account = "deployer".into();
//!     cfg.grace = Duration::from_secs(1);
//!
//!     let store = Arc::new(MemoryStore::new());
//!     let template = cfg.deployer_template();
//!
//!     let reconciler = {
//!         let store = store.clone();
//!         ReconcileFn::arc("create-deployer", move |record: DeploymentRecord| {
//!             let store = store.clone();
//!             let pod = template.pod_for(&record);
//!             async move {
//!                 store.create_pod(record.namespace(), pod).await?;
//!                 Ok::<(), ReconcileError>(())
//!             }
//!         })
//!     };
//!
//!     let controller = Controller::builder(cfg)
//!         .with_reconciler(reconciler)
//!         .with_feed(StaticFeed::new(vec![DeploymentRecord::new(
//!             ObjectKey::new("default", "web-1"),
//!             StrategyDescriptor::Rolling,
//!         )]))
//!         .build()?;
//!
//!     let handle = controller.handle();
//!     let probe = store.clone();
//!     tokio::spawn(async move {
//!         while probe.pods().await.is_empty() {
//!             tokio::time::sleep(Duration::from_millis(5)).await;
//!         }
//!         handle.shutdown();
//!     });
//!
//!     controller.run().await?;
//!     assert_eq!(store.pods().await[0].name, "web-1-deploy");
//!     Ok(())
//! }
//! ```
mod core;
mod deployment;
mod error;
mod events;
mod policies;
mod queue;
mod reconcile;
mod recorder;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    ChannelFeed, Config, ControlLoop, Controller, ControllerBuilder, ControllerHandle, FeedRef,
    FeedSender, Outcome, RateLimitConfig, RetryDecision, RetryManager, StaticFeed, WatchFeed,
    wait_for_shutdown_signal,
};
pub use deployment::{
    Container, CustomParams, DEPLOYER_CONTAINER_NAME, DEPLOYER_POD_FOR_LABEL,
    DeployerContainerSpec, DeployerTemplate, DeploymentRecord, EnvVar, ObjectKey, Pod,
    StrategyDescriptor, StrategyKind, StrategyResolver, deployer_pod, deployer_pod_name, resolve,
};
pub use error::{ConfigError, ErrorClass, ReconcileError, RuntimeError, StoreError, StrategyError};
pub use events::{Bus, Event, EventKind};
pub use policies::{MAX_RECORDED_FAILURES, RateLimiter, RetryPolicy, RetryState, classify};
pub use queue::{Enqueued, ReconcileQueue};
pub use reconcile::{Reconcile, ReconcileFn, ReconcileRef};
pub use recorder::{
    EVENT_COMPONENT, EventSink, EventSinkRef, MemorySink, REASON_FAILED_RETRY, RecordedEvent,
    TracingSink,
};
pub use store::{MemoryStore, ResourceStore, StoreRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
