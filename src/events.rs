//! Bounded event fan-out
//!
//! Subscribers get their own bounded channel; a slow subscriber drops events
//! instead of blocking the publisher.

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::warn;

/// Fan-out bus with one bounded channel per subscriber
#[derive(Debug)]
pub struct EventBus<T> {
    subscribers: RwLock<Vec<mpsc::Sender<T>>>,
    capacity: usize,
}

impl<T: Clone> EventBus<T> {
    /// Create a bus whose subscriber channels hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Register a new subscriber and return its receiving end
    pub fn subscribe(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.write().push(tx);
        rx
    }

    /// Publish an event to every live subscriber
    ///
    /// Full channels drop the event for that subscriber; closed channels are
    /// pruned. Returns the number of subscribers that received the event.
    pub fn publish(&self, event: &T) -> usize {
        let mut delivered = 0;
        let mut closed = false;

        {
            let subscribers = self.subscribers.read();
            for tx in subscribers.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("event subscriber channel full, event dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed = true,
                }
            }
        }

        if closed {
            self.subscribers.write().retain(|tx| !tx.is_closed());
        }

        delivered
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Drop all subscriber channels, closing their receivers
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}
