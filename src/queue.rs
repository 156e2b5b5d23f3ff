//! # Deduplicating reconcile queue.
//!
//! [`ReconcileQueue`] is a FIFO of object keys holding **at most one pending
//! record per key**. It is the only structure shared between the watch feed
//! (producer) and the control loop (consumer).
//!
//! ```text
//! enqueue(k1, r1)   [k1:r1]
//! enqueue(k2, r2)   [k1:r1, k2:r2]
//! enqueue(k1, r1')  [k1:r1', k2:r2]      ← coalesced: same position, newest record
//! pop()             → (k1, r1')          [k2:r2]
//! ```
//!
//! ## Rules
//! - `enqueue` replaces a pending record in place; the key keeps its position.
//! - `enqueue_if_absent` (used for retries) never overwrites a pending record,
//!   so a retry cannot clobber a newer version delivered by the feed.
//! - `pop` waits for an item; after [`close`](ReconcileQueue::close) it drains
//!   what is left, then returns `None`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::deployment::{DeploymentRecord, ObjectKey};

/// Result of an enqueue call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enqueued {
    /// Key was not pending and has been appended.
    Added,
    /// Key was pending; its record was replaced.
    Coalesced,
    /// Key was pending and left untouched (`enqueue_if_absent`).
    AlreadyPending,
    /// Queue is closed; nothing was queued.
    Closed,
}

#[derive(Default)]
struct State {
    order: VecDeque<ObjectKey>,
    items: HashMap<ObjectKey, DeploymentRecord>,
    closed: bool,
}

/// FIFO of keys with one pending record per key.
#[derive(Default)]
pub struct ReconcileQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl ReconcileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `record` under `key`, replacing a pending record for the same key.
    pub fn enqueue(&self, key: ObjectKey, record: DeploymentRecord) -> Enqueued {
        let mut state = self.lock();
        if state.closed {
            return Enqueued::Closed;
        }
        if let Some(pending) = state.items.get_mut(&key) {
            *pending = record;
            return Enqueued::Coalesced;
        }
        state.order.push_back(key.clone());
        state.items.insert(key, record);
        drop(state);

        self.notify.notify_one();
        Enqueued::Added
    }

    /// Queues `record` only if nothing is pending for `key`.
    pub fn enqueue_if_absent(&self, key: ObjectKey, record: DeploymentRecord) -> Enqueued {
        let mut state = self.lock();
        if state.closed {
            return Enqueued::Closed;
        }
        if state.items.contains_key(&key) {
            return Enqueued::AlreadyPending;
        }
        state.order.push_back(key.clone());
        state.items.insert(key, record);
        drop(state);

        self.notify.notify_one();
        Enqueued::Added
    }

    /// Removes and returns the oldest pending item, waiting if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained. Cancel-safe.
    pub async fn pop(&self) -> Option<(ObjectKey, DeploymentRecord)> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if let Some(item) = Self::take_front(&mut state) {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Non-waiting variant of [`pop`](Self::pop).
    pub fn try_pop(&self) -> Option<(ObjectKey, DeploymentRecord)> {
        Self::take_front(&mut self.lock())
    }

    /// Stops accepting items and wakes every waiting `pop`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record is pending for `key`.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.lock().items.contains_key(key)
    }

    fn take_front(state: &mut State) -> Option<(ObjectKey, DeploymentRecord)> {
        while let Some(key) = state.order.pop_front() {
            if let Some(record) = state.items.remove(&key) {
                return Some((key, record));
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
