use serde::{Deserialize, Serialize};

use crate::api::models::Message;

/// Events this client emits over the live channel. Serialized as JSON text
/// frames tagged `event` with the payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { chat_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { chat_id: String },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        chat_id: String,
        sender_id: String,
        receiver_id: String,
        message: String,
    },
}

/// Events pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A message delivered to every subscriber of its room, including the
    /// sender's own echo.
    NewMessage(Message),
    /// Out-of-band notification, consumed outside the chat views.
    Notification(serde_json::Value),
}
