//! # Demo: deployer
//!
//! Runs the controller against an in-memory store and prints what happens.
//!
//! Shows how to:
//! - Build a [`Controller`] with a [`ChannelFeed`], the [`LogWriter`], and a [`MemorySink`].
//! - Write a reconciler that creates deployer pods from a [`DeployerTemplate`].
//! - Pick the right [`ReconcileError`] variant so the retry policy does the rest.
//!
//! ## Flow
//! ```text
//! producer ──► ChannelFeed ──► ReconcileQueue ──► ControlLoop ──► create-deployer
//!   web-1 (Rolling)                                  ├─ Ok                 → pod web-1-deploy
//!   hooks (Custom image)                             ├─ Ok                 → pod hooks-deploy
//!   broken (annotated)                               └─ Actionable × 3     → FailedRetry warning
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example deployer
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use deployvisor::{
    ChannelFeed, Config, Controller, DeployerTemplate, DeploymentRecord, EnvVar, LogWriter,
    MemorySink, MemoryStore, ObjectKey, ReconcileError, ReconcileFn, ReconcileRef,
    ResourceStore, StrategyDescriptor, Subscribe,
};
use tracing_subscriber::EnvFilter;

const BROKEN_ANNOTATION: &str = "demo/break-deployer";

fn reconciler(store: Arc<MemoryStore>, template: DeployerTemplate) -> ReconcileRef {
    ReconcileFn::arc("create-deployer", move |record: DeploymentRecord| {
        let store = store.clone();
        let pod = template.pod_for(&record);
        async move {
            if record.annotations.contains_key(BROKEN_ANNOTATION) {
                return Err(ReconcileError::actionable(format!(
                    "deployer pod {} failed",
                    pod.name
                )));
            }
            match store.get_pod(record.namespace(), &pod.name).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(ReconcileError::from(e)),
            }
            store.create_pod(record.namespace(), pod).await?;
            Ok(())
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cfg = Config::new("registry.local/deployer:v1");
    cfg.environment = vec![EnvVar::new("CLUSTER", "demo")];
    cfg.service_account = "deployer".into();
    cfg.grace = Duration::from_secs(2);
    cfg.rate_limit.refill_every = Duration::from_millis(200);

    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemorySink::new());
    let (tx, feed) = ChannelFeed::new();

    let controller = Controller::builder(cfg.clone())
        .with_reconciler(reconciler(store.clone(), cfg.deployer_template()))
        .with_feed(feed)
        .with_event_sink(sink.clone())
        .with_subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
        .build()
        .context("building controller")?;
    let handle = controller.handle();

    let records = vec![
        DeploymentRecord::new(ObjectKey::new("default", "web-1"), StrategyDescriptor::Rolling),
        DeploymentRecord::new(
            ObjectKey::new("default", "hooks"),
            StrategyDescriptor::custom("registry.local/hooks:v3", vec![EnvVar::new("HOOK", "pre")]),
        ),
        DeploymentRecord::new(ObjectKey::new("default", "broken"), StrategyDescriptor::Recreate)
            .with_annotation(BROKEN_ANNOTATION, "true"),
    ];
    for record in records {
        tx.send((record.key().clone(), record))
            .context("feed closed early")?;
    }

    let watcher = {
        let sink = sink.clone();
        tokio::spawn(async move {
            while sink.is_empty() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            handle.shutdown();
        })
    };

    controller.run().await?;
    watcher.await?;

    for pod in store.pods().await {
        println!(
            "pod {}/{} image={} env={:?}",
            pod.namespace, pod.name, pod.containers[0].image, pod.containers[0].env
        );
    }
    for event in sink.events() {
        println!("event {} {}: {}", event.key, event.reason, event.message);
    }
    Ok(())
}
