//! In-process publish/subscribe over a single `tokio::sync::broadcast`
//! channel. `send` never awaits; a lagging or absent subscriber just misses
//! events rather than blocking the publisher.

use gw_domain::event::GatewayEvent;
use tokio::sync::broadcast;

const CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    /// Clonable handle usable anywhere a publisher needs to emit events
    /// (the registry, the session sweeper, the qwen adapter).
    pub fn sender(&self) -> broadcast::Sender<GatewayEvent> {
        self.sender.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
