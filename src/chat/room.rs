use std::sync::Arc;

use crate::error::Result;
use crate::socket::{ClientEvent, LiveChannel};

/// Scopes live delivery to the conversation currently on screen.
///
/// Tracks the joined room locally, so re-joining the room already held
/// emits nothing and switching rooms is always leave-then-join. At most one
/// room is joined per instance at any time.
pub struct RoomMembership {
    channel: Arc<dyn LiveChannel>,
    current: Option<String>,
}

impl RoomMembership {
    pub fn new(channel: Arc<dyn LiveChannel>) -> Self {
        Self {
            channel,
            current: None,
        }
    }

    /// Chat id of the room currently joined, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Join `chat_id`, leaving the previous room first. An empty id is
    /// ignored; a join is only attempted once the conversation identifier
    /// is known.
    pub fn join(&mut self, chat_id: &str) -> Result<()> {
        if chat_id.is_empty() || self.current.as_deref() == Some(chat_id) {
            return Ok(());
        }
        self.leave()?;
        self.channel.emit(ClientEvent::JoinRoom {
            chat_id: chat_id.to_string(),
        })?;
        self.current = Some(chat_id.to_string());
        Ok(())
    }

    /// Leave the current room, if any.
    pub fn leave(&mut self) -> Result<()> {
        if let Some(chat_id) = self.current.take() {
            self.channel.emit(ClientEvent::LeaveRoom { chat_id })?;
        }
        Ok(())
    }
}
