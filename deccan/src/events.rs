//! Typed cross-component signal channel.
//!
//! The explorer core reacts to two signals raised elsewhere in the
//! application (place lists, panels): "select and fly to a place" and "open
//! login". It publishes neither. The bus is an explicit, typed channel
//! passed to the core at construction - there is no process-wide registry.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::catalog::Place;

/// Signals carried by the [`EventBus`].
#[derive(Debug, Clone)]
pub enum AppSignal {
    /// Select the given place and fly the camera to it.
    FlyToPlace(Place),
    /// Open the login dialog. The core only forwards this to the shell.
    OpenLogin,
}

/// A minimal typed publish/subscribe bus.
///
/// Each subscriber gets its own queue; signals are delivered to every live
/// subscriber in publish order. Dropping the receiver unsubscribes - closed
/// queues are pruned on the next publish, so a torn-down component can never
/// receive a signal twice or leak its registration.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<AppSignal>>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its signal queue.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AppSignal> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Delivers the signal to every live subscriber.
    pub fn publish(&self, signal: AppSignal) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(signal.clone()).is_ok());
    }

    /// Count of live subscribers. Closed queues are only pruned on publish,
    /// so the count may briefly include them.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
