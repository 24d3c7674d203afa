//! Live-channel transport: the shared websocket connection and the event
//! frames carried over it.

pub mod client;
pub mod events;

pub use client::SocketClient;
pub use events::{ClientEvent, ServerEvent};

use crate::error::Result;

/// Emit side of the live channel. The room controller and chat session
/// depend on this seam rather than on the concrete socket client, so tests
/// can substitute an in-memory channel.
pub trait LiveChannel: Send + Sync {
    /// Queue an event for delivery. Fire-and-forget: a successful return
    /// means the event was accepted locally, not that the server saw it.
    fn emit(&self, event: ClientEvent) -> Result<()>;
}
