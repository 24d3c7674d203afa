use serde::{Deserialize, Serialize};

/// REST response envelope; every endpoint wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    General,
    Order,
}

impl ChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::General => "general",
            ChatType::Order => "order",
        }
    }
}

/// A conversation between two participants, optionally scoped to one order.
/// The backend guarantees one conversation per (pair, order, type); the
/// client treats create-or-get as idempotent and never deletes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub user_one_id: String,
    pub user_two_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub chat_type: ChatType,
    #[serde(default)]
    pub created_at: String,
}

impl Conversation {
    /// The participant on the other side of the conversation from `user_id`.
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.user_one_id == user_id {
            &self.user_two_id
        } else {
            &self.user_one_id
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    #[serde(default)]
    pub created_at: String,
}

/// Raw counterpart record as returned by the directory endpoint. Display
/// resolution happens in [`crate::chat::ChatDirectory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub role: String,
    pub chat_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
}

/// Filter for the directory listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct PartnerQuery {
    pub user_id: String,
    pub search: Option<String>,
    pub role: Option<String>,
    pub chat_type: Option<ChatType>,
}
