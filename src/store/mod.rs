//! # Resource store access.
//!
//! - [`ResourceStore`]: capability set used by reconciliation bodies
//! - [`MemoryStore`]: in-process implementation with failure injection

mod client;
mod memory;

pub use client::{ResourceStore, StoreRef};
pub use memory::MemoryStore;
