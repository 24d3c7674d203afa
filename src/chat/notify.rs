use serde_json::Value;

use crate::socket::ServerEvent;

/// Collects out-of-band notification payloads pushed over the live
/// channel, independent of any open conversation. The host drains them
/// into whatever badge/toast surface it renders.
#[derive(Default)]
pub struct NotificationStore {
    items: Vec<Value>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a live event in; returns whether it was a notification.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        if let ServerEvent::Notification(payload) = event {
            self.items.push(payload.clone());
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hand the pending notifications to the consumer and reset.
    pub fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.items)
    }
}
