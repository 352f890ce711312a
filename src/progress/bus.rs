//! In-process, ordered fan-out of progress events.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::event::ProgressEvent;

/// Every subscriber receives every event published after it subscribed, in
/// publication order. Subscribers whose receiver was dropped are pruned.
#[derive(Clone, Default)]
pub struct ProgressBus {
    subscribers: Arc<Mutex<Vec<Sender<ProgressEvent>>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ProgressEvent> {
        let (sender, receiver) = channel();
        self.subscribers.lock().push(sender);
        receiver
    }

    pub fn publish(&self, event: ProgressEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| s.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
