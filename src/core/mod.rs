//! Controller runtime.
//!
//! - [`Config`], [`RateLimitConfig`]: configuration
//! - [`Controller`], [`ControllerBuilder`], [`ControllerHandle`]: wiring and lifecycle
//! - [`ControlLoop`], [`Outcome`]: the single queue consumer
//! - [`RetryManager`], [`RetryDecision`]: per-key retry state and rate-limited requeue
//! - [`WatchFeed`], [`StaticFeed`], [`ChannelFeed`]: record sources

mod builder;
mod config;
mod control_loop;
mod controller;
mod feed;
mod retry;
mod shutdown;

pub use builder::ControllerBuilder;
pub use config::{Config, RateLimitConfig};
pub use control_loop::{ControlLoop, Outcome};
pub use controller::{Controller, ControllerHandle};
pub use feed::{ChannelFeed, FeedRef, FeedSender, StaticFeed, WatchFeed};
pub use retry::{RetryDecision, RetryManager};
pub use shutdown::wait_for_shutdown_signal;
