//! Process-wide data change notifications
//!
//! Views holding cached contract lists subscribe to the [`EventBus`] and
//! reload when a [`DataEvent::ContractsChanged`] arrives.

use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 16;

/// Broadcast data change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEvent {
    /// A contract was created; cached contract data is stale
    ContractsChanged,
}

/// Cloneable broadcast channel; clones publish to the same subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DataEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`; returns how many subscribers received it
    pub fn publish(&self, event: DataEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(?event, receivers, "Published data event");
                receivers
            }
            // No subscribers is not an error
            Err(_) => 0,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
