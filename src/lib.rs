//! Real-time chat client for a marketplace vendor dashboard.
//!
//! The crate is the headless half of the dashboard's chat feature: REST
//! calls resolve conversations, history, and the counterpart directory,
//! while a single shared websocket carries live events. A UI binds
//! [`chat::ChatSession`] for the open conversation, [`chat::ChatDirectory`]
//! for the list screens, and [`socket::SocketClient`] for the connection
//! itself, which the composition root opens once and closes on exit.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod socket;
pub mod storage;

pub use api::ApiClient;
pub use api::models::{ChatType, Conversation, Message, PartnerQuery};
pub use chat::{
    ChatDirectory, ChatSession, Delivery, MessageEntry, MessageStore, NotificationStore,
    PartnerEntry, RoomMembership, SessionState,
};
pub use config::{ChatConfig, SupportContact};
pub use error::{ChatError, Result};
pub use socket::{ClientEvent, LiveChannel, ServerEvent, SocketClient};
pub use storage::PartnerCache;
