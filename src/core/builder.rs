use std::sync::Arc;

use super::config::Config;
use super::controller::Controller;
use super::feed::{FeedRef, WatchFeed};
use crate::error::ConfigError;
use crate::events::Bus;
use crate::reconcile::ReconcileRef;
use crate::recorder::{EventSinkRef, TracingSink};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Controller`].
pub struct ControllerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    reconciler: Option<ReconcileRef>,
    feed: Option<FeedRef>,
    sink: Option<EventSinkRef>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            reconciler: None,
            feed: None,
            sink: None,
        }
    }

    /// Sets the reconciliation body. Required.
    pub fn with_reconciler(mut self, reconciler: ReconcileRef) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    /// Sets the watch feed. Without one, records only arrive through
    /// [`ControllerHandle::enqueue`](crate::ControllerHandle::enqueue).
    pub fn with_feed<F: WatchFeed>(mut self, feed: F) -> Self {
        self.feed = Some(Arc::new(feed));
        self
    }

    /// Sets where operator-facing warnings go. Defaults to [`TracingSink`].
    pub fn with_event_sink(mut self, sink: EventSinkRef) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and builds the controller.
    ///
    /// Must be called inside a Tokio runtime: subscriber workers and the
    /// bus listener are spawned here.
    pub fn build(self) -> Result<Controller, ConfigError> {
        self.cfg.validate()?;
        let reconciler = self.reconciler.ok_or(ConfigError::MissingReconciler)?;
        let sink: EventSinkRef = match self.sink {
            Some(sink) => sink,
            None => Arc::new(TracingSink),
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        Ok(Controller::new_internal(
            self.cfg, bus, subs, sink, reconciler, self.feed,
        ))
    }
}
