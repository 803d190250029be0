//! Resource notifications.

use moneylog_shared::types::UserId;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::resource::ResourcePath;

/// Default capacity of the broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something happened to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// A resource was created.
    Created {
        /// Address of the new resource.
        resource: ResourcePath,
        /// The creating user.
        owner: UserId,
    },
}

/// Receives resource notifications. Emitting never fails the caller.
pub trait EventSink: Send + Sync {
    /// Publishes an event.
    fn emit(&self, event: ResourceEvent);
}

/// Fans events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<ResourceEvent>,
}

impl BroadcastEventSink {
    /// Creates a sink with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: ResourceEvent) {
        match &event {
            ResourceEvent::Created { resource, owner } => {
                info!(resource = %resource, owner = %owner, "resource created");
            }
        }
        if self.sender.send(event).is_err() {
            debug!("no event subscribers");
        }
    }
}
