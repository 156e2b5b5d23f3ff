//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom handlers into the
//! controller's event stream (metrics, audit logs, test probes).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue; overflow drops the event
//!   for that subscriber and publishes `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block the control loop.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use deployvisor::{Event, EventKind, Subscribe};
//!
//! struct AbandonCounter;
//!
//! #[async_trait]
//! impl Subscribe for AbandonCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RetryAbandoned {
//!             // bump a counter...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "abandon-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
