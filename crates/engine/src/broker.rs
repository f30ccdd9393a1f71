// SPDX-License-Identifier: MIT

//! The Pub/Sub Broker (C1): typed, bounded fanout of lifecycle events to N
//! subscribers.
//!
//! `publish` never blocks: a subscriber whose buffer is full has that one
//! event dropped and counted, the rest of the fanout proceeds unaffected.
//! The canonical state always lives in the Registry / worker-result map, so
//! a dropped event is never the only record of something happening.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default bounded capacity for a subscriber's event queue.
pub const DEFAULT_CAPACITY: usize = 64;

struct Subscribers<T>(Mutex<HashMap<u64, mpsc::Sender<T>>>);

/// Typed broker over event payload `T`. Cheap to clone; cloning shares the
/// same subscriber set.
pub struct Broker<T> {
    subscribers: Arc<Subscribers<T>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
    drop_count: Arc<AtomicU64>,
    closed: Arc<std::sync::atomic::AtomicBool>,
}

impl<T> Clone for Broker<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
            next_id: self.next_id.clone(),
            capacity: self.capacity,
            drop_count: self.drop_count.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Broker<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Subscribers(Mutex::new(HashMap::new()))),
            next_id: Arc::new(AtomicU64::new(0)),
            capacity,
            drop_count: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Subscribe for events. Returns an independent bounded receiver.
    /// Cancelling `cancellation` removes the subscriber and releases its
    /// buffer; a cancelled subscriber never receives further events. If the
    /// broker has already been shut down, the returned receiver is
    /// immediately closed.
    pub fn subscribe(&self, cancellation: CancellationToken) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(self.capacity.max(1));
        if self.closed.load(Ordering::SeqCst) {
            return rx;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.0.lock().insert(id, tx);

        let subscribers = self.subscribers.clone();
        tokio::spawn(async move {
            cancellation.cancelled().await;
            subscribers.0.lock().remove(&id);
        });
        rx
    }

    /// Non-blocking publish to every live subscriber. Full subscriber
    /// buffers drop this event for that subscriber only; the drop is
    /// counted via [`Broker::drop_count`].
    pub fn publish(&self, event: T) {
        let mut subscribers = self.subscribers.0.lock();
        subscribers.retain(|_, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.drop_count.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Close every subscriber stream and reject later `subscribe` calls
    /// with an already-closed receiver.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.0.lock().clear();
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.0.lock().len()
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
