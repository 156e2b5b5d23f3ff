//! # Controller: wires the feed, queue, control loop, and shutdown together.
//!
//! The [`Controller`] owns the event bus, the [`SubscriberSet`], the shared
//! [`RateLimiter`], and the [`ReconcileQueue`]. [`Controller::run`] starts
//! the pieces and drives graceful shutdown.
//!
//! ## High-level architecture
//! ```text
//! WatchFeed ──► pump ──► ReconcileQueue ◄── ControllerHandle::enqueue
//!                            │   ▲
//!                          pop   │ enqueue_if_absent (rate limited)
//!                            ▼   │
//!                        ControlLoop ──► Reconcile::reconcile(record)
//!                            │
//!                     RetryManager ──► RetryPolicy ──► EventSink (FailedRetry)
//!
//! Event flow:
//!   pump / ControlLoop / RetryManager ── publish ──► Bus ──► listener ──► SubscriberSet
//!
//! Shutdown path:
//!   OS signal | ControllerHandle::shutdown()
//!     └─► publish ShutdownRequested
//!     └─► cancel runtime token, close queue
//!     └─► wait for the control loop up to cfg.grace:
//!            ├─ stopped  → publish AllStoppedWithin
//!            └─ timeout  → publish GraceExceeded, Err(GraceExceeded)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use deployvisor::{
//!     Config, Controller, DeploymentRecord, ObjectKey, ReconcileError, ReconcileFn,
//!     StrategyDescriptor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::new("registry.local/deployer:v1");
//!     cfg.grace = Duration::from_secs(1);
//!
//!     let controller = Controller::builder(cfg)
//!         .with_reconciler(ReconcileFn::arc("noop", |_r: DeploymentRecord| async {
//!             Ok::<(), ReconcileError>(())
//!         }))
//!         .build()?;
//!
//!     let handle = controller.handle();
//!     handle.enqueue(DeploymentRecord::new(
//!         ObjectKey::new("default", "web-1"),
//!         StrategyDescriptor::Rolling,
//!     ));
//!     handle.shutdown();
//!
//!     controller.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::config::Config;
use super::control_loop::ControlLoop;
use super::feed::{self, FeedRef};
use super::shutdown;
use crate::deployment::{DeployerTemplate, DeploymentRecord, StrategyResolver};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{RateLimiter, RetryPolicy};
use crate::queue::{Enqueued, ReconcileQueue};
use crate::reconcile::ReconcileRef;
use crate::recorder::EventSinkRef;
use crate::subscribers::SubscriberSet;

/// Deployment controller runtime.
///
/// Built with [`Controller::builder`]. `run` may be called once.
pub struct Controller {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    queue: Arc<ReconcileQueue>,
    limiter: Arc<RateLimiter>,
    sink: EventSinkRef,
    reconciler: ReconcileRef,
    feed: Option<FeedRef>,
    token: CancellationToken,
    started: AtomicBool,
}

impl Controller {
    /// Starts building a controller from `cfg`.
    pub fn builder(cfg: Config) -> super::builder::ControllerBuilder {
        super::builder::ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        sink: EventSinkRef,
        reconciler: ReconcileRef,
        feed: Option<FeedRef>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(&cfg.rate_limit));
        let controller = Self {
            cfg,
            bus,
            subs,
            queue: Arc::new(ReconcileQueue::new()),
            limiter,
            sink,
            reconciler,
            feed,
            token: CancellationToken::new(),
            started: AtomicBool::new(false),
        };
        controller.subscriber_listener();
        controller
    }

    /// Handle for enqueueing records and requesting shutdown.
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            queue: Arc::clone(&self.queue),
            bus: self.bus.clone(),
            token: self.token.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Resolver bound to the configured deployer image and environment.
    pub fn resolver(&self) -> StrategyResolver {
        self.cfg.resolver()
    }

    /// Deployer pod template bound to the configuration.
    pub fn deployer_template(&self) -> DeployerTemplate {
        self.cfg.deployer_template()
    }

    /// The shared retry rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Runs until shutdown is requested or the queue is closed and drained.
    ///
    /// Shutdown comes from an OS signal or [`ControllerHandle::shutdown`].
    /// Returns [`RuntimeError::GraceExceeded`] if the control loop does not
    /// stop within `cfg.grace`, and [`RuntimeError::AlreadyRunning`] on a
    /// second call.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }

        if let Some(feed) = self.feed.clone() {
            self.spawn_feed_pump(feed);
        }

        let control = ControlLoop::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.reconciler),
            RetryPolicy::new(Arc::clone(&self.sink)),
            Arc::clone(&self.limiter),
            self.bus.clone(),
        );
        debug!(reconciler = control.reconciler_name(), "starting control loop");
        let mut handle = tokio::spawn(control.run(self.token.child_token()));

        tokio::select! {
            _ = Self::os_signal() => {}
            _ = self.token.cancelled() => {}
            res = &mut handle => {
                if let Err(e) = res {
                    error!(error = %e, "control loop task failed");
                }
                return Ok(());
            }
        }

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.token.cancel();
        self.queue.close();
        self.wait_with_grace(handle).await
    }

    /// Resolves on a termination signal; never resolves if listeners cannot be installed.
    async fn os_signal() {
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            warn!(error = %e, "cannot listen for termination signals");
            std::future::pending::<()>().await;
        }
    }

    fn spawn_feed_pump(&self, feed: FeedRef) {
        let queue = Arc::clone(&self.queue);
        let bus = self.bus.clone();
        let token = self.token.child_token();
        tokio::spawn(async move {
            if let Err(e) = feed::pump(feed, queue, bus, token).await {
                error!(error = %e, "watch feed pump stopped");
            }
        });
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    async fn wait_with_grace(&self, mut handle: JoinHandle<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        match time::timeout(grace, &mut handle).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                handle.abort();
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }
}

/// Cloneable handle to a [`Controller`].
#[derive(Clone)]
pub struct ControllerHandle {
    queue: Arc<ReconcileQueue>,
    bus: Bus,
    token: CancellationToken,
}

impl ControllerHandle {
    /// Queues `record` for reconciliation, coalescing with a pending record for the same key.
    pub fn enqueue(&self, record: DeploymentRecord) -> Enqueued {
        let key = record.key().clone();
        let result = self.queue.enqueue(key.clone(), record);
        feed::publish_enqueued(&self.bus, &key, result);
        result
    }

    /// Requests a graceful shutdown of [`Controller::run`].
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of keys waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
