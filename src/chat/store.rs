use std::time::{Duration, Instant};

use crate::api::models::Message;

/// Delivery state of one entry, tracked locally instead of assuming the
/// server echo always arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent on the live channel, no echo seen yet.
    Pending,
    /// Present in server history or confirmed by its echo.
    Confirmed,
    /// No echo within the allowed window.
    Failed,
}

#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub message: Message,
    pub delivery: Delivery,
    queued_at: Option<Instant>,
}

/// Ordered, de-duplicated message list for the active conversation.
///
/// Every conversation switch bumps a generation token; history fetched for
/// an earlier generation is stale and dropped on arrival, so a slow
/// response can never overwrite the conversation the view has since moved
/// to.
#[derive(Default)]
pub struct MessageStore {
    chat_id: Option<String>,
    generation: u64,
    entries: Vec<MessageEntry>,
    revision: u64,
    next_local_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every visible change; lets a view follow the newest entry.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Point the store at a new conversation. Clears the list and returns
    /// the generation token the matching history load must present.
    pub fn begin_conversation(&mut self, chat_id: &str) -> u64 {
        self.chat_id = Some(chat_id.to_string());
        self.entries.clear();
        self.generation += 1;
        self.revision += 1;
        self.generation
    }

    /// Wholesale replace with server history. Applied only when
    /// `generation` is still current; a superseded result is dropped and
    /// `false` returned.
    pub fn replace_history(&mut self, generation: u64, messages: Vec<Message>) -> bool {
        if generation != self.generation {
            log::debug!(
                "dropping stale history load (generation {} superseded by {})",
                generation,
                self.generation
            );
            return false;
        }
        self.entries = messages
            .into_iter()
            .map(|message| MessageEntry {
                message,
                delivery: Delivery::Confirmed,
                queued_at: None,
            })
            .collect();
        self.revision += 1;
        true
    }

    /// Record a locally-sent message before any server confirmation exists.
    /// The entry carries a provisional identifier until its echo adopts the
    /// server-assigned one; returns that provisional id.
    pub fn push_pending(
        &mut self,
        chat_id: &str,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
    ) -> String {
        self.next_local_id += 1;
        let local_id = format!("local-{}", self.next_local_id);
        let message = Message {
            id: local_id.clone(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            message: body.to_string(),
            created_at: String::new(),
        };
        self.entries.push(MessageEntry {
            message,
            delivery: Delivery::Pending,
            queued_at: Some(Instant::now()),
        });
        self.revision += 1;
        local_id
    }

    /// Fold one live-channel message into the list. Returns `false` when
    /// the message was ignored (wrong conversation or duplicate
    /// identifier). Appends keep arrival order; no re-sorting.
    pub fn append_live(&mut self, message: Message) -> bool {
        if self.chat_id.as_deref() != Some(message.chat_id.as_str()) {
            log::debug!("ignoring live message for inactive chat {}", message.chat_id);
            return false;
        }
        if self.entries.iter().any(|e| e.message.id == message.id) {
            log::debug!("suppressing duplicate message {}", message.id);
            return false;
        }
        // The sender's own echo confirms the oldest matching pending entry
        // in place rather than growing the list.
        if let Some(entry) = self.entries.iter_mut().find(|e| {
            e.delivery == Delivery::Pending
                && e.message.sender_id == message.sender_id
                && e.message.message == message.message
        }) {
            entry.message = message;
            entry.delivery = Delivery::Confirmed;
            entry.queued_at = None;
            self.revision += 1;
            return true;
        }
        self.entries.push(MessageEntry {
            message,
            delivery: Delivery::Confirmed,
            queued_at: None,
        });
        self.revision += 1;
        true
    }

    /// Mark pending sends older than `max_age` as failed. Returns how many
    /// entries changed.
    pub fn reap_pending(&mut self, max_age: Duration) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.delivery == Delivery::Pending {
                if let Some(queued_at) = entry.queued_at {
                    if queued_at.elapsed() >= max_age {
                        entry.delivery = Delivery::Failed;
                        entry.queued_at = None;
                        changed += 1;
                    }
                }
            }
        }
        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    /// Drop all state; the view is closing.
    pub fn clear(&mut self) {
        self.chat_id = None;
        self.entries.clear();
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, chat_id: &str, sender_id: &str, body: &str) -> Message {
        Message {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            receiver_id: "other".into(),
            message: body.into(),
            created_at: String::new(),
        }
    }

    #[test]
    fn duplicate_identifiers_are_suppressed() {
        let mut store = MessageStore::new();
        store.begin_conversation("chat_1");
        assert!(store.append_live(message("m1", "chat_1", "u2", "hi")));
        assert!(!store.append_live(message("m1", "chat_1", "u2", "hi")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn history_replace_drops_the_previous_conversation() {
        let mut store = MessageStore::new();
        let first = store.begin_conversation("chat_1");
        assert!(store.replace_history(first, vec![message("m1", "chat_1", "u2", "old")]));

        let second = store.begin_conversation("chat_2");
        assert!(store.replace_history(second, vec![message("m9", "chat_2", "u3", "new")]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].message.id, "m9");
        assert_eq!(store.chat_id(), Some("chat_2"));
    }

    #[test]
    fn stale_history_load_is_dropped() {
        let mut store = MessageStore::new();
        let stale = store.begin_conversation("chat_1");
        let current = store.begin_conversation("chat_2");
        assert!(store.replace_history(current, vec![message("m2", "chat_2", "u3", "fresh")]));

        // The delayed response for chat_1 arrives after the switch.
        assert!(!store.replace_history(stale, vec![message("m1", "chat_1", "u2", "late")]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].message.chat_id, "chat_2");
    }

    #[test]
    fn echo_confirms_the_pending_entry_without_growing_the_list() {
        let mut store = MessageStore::new();
        let generation = store.begin_conversation("chat_1");
        store.replace_history(generation, Vec::new());

        let local_id = store.push_pending("chat_1", "me", "u2", "Hello");
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].delivery, Delivery::Pending);

        assert!(store.append_live(message("m1", "chat_1", "me", "Hello")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].delivery, Delivery::Confirmed);
        assert_eq!(store.entries()[0].message.id, "m1");
        assert_ne!(store.entries()[0].message.id, local_id);
    }

    #[test]
    fn live_message_for_another_chat_is_ignored() {
        let mut store = MessageStore::new();
        store.begin_conversation("chat_1");
        assert!(!store.append_live(message("m1", "chat_2", "u2", "hi")));
        assert!(store.is_empty());
    }

    #[test]
    fn unechoed_sends_are_marked_failed() {
        let mut store = MessageStore::new();
        store.begin_conversation("chat_1");
        store.push_pending("chat_1", "me", "u2", "anyone there?");
        assert_eq!(store.reap_pending(Duration::ZERO), 1);
        assert_eq!(store.entries()[0].delivery, Delivery::Failed);
        // A second pass finds nothing left to fail.
        assert_eq!(store.reap_pending(Duration::ZERO), 0);
    }

    #[test]
    fn revision_tracks_visible_changes() {
        let mut store = MessageStore::new();
        let before = store.revision();
        store.begin_conversation("chat_1");
        store.append_live(message("m1", "chat_1", "u2", "hi"));
        assert!(store.revision() > before);

        let unchanged = store.revision();
        store.append_live(message("m1", "chat_1", "u2", "hi"));
        assert_eq!(store.revision(), unchanged);
    }
}
