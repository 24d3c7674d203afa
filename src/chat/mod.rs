//! Headless chat components: everything between the transport and a UI.

pub mod directory;
pub mod notify;
pub mod room;
pub mod session;
pub mod store;

pub use directory::{ChatDirectory, PartnerEntry};
pub use notify::NotificationStore;
pub use room::RoomMembership;
pub use session::{ChatSession, SessionState};
pub use store::{Delivery, MessageEntry, MessageStore};
