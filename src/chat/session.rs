use std::sync::Arc;
use std::time::Duration;

use crate::api::client::ApiClient;
use crate::api::models::{ChatType, Conversation, Message};
use crate::chat::room::RoomMembership;
use crate::chat::store::MessageStore;
use crate::error::{ChatError, Result};
use crate::socket::{ClientEvent, LiveChannel, ServerEvent};

/// View-local lifecycle. `Joined` for one conversation never coexists with
/// `Joined` for another in the same session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Joined,
}

/// Binds one open conversation to the room controller and message store
/// and drives the send action. One instance per mounted chat view; the
/// navigation model guarantees a single mounted view at a time, which is
/// what lets the store go unlocked.
pub struct ChatSession {
    api: ApiClient,
    channel: Arc<dyn LiveChannel>,
    room: RoomMembership,
    store: MessageStore,
    user_id: String,
    conversation: Option<Conversation>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(api: ApiClient, channel: Arc<dyn LiveChannel>, user_id: &str) -> Self {
        let room = RoomMembership::new(channel.clone());
        Self {
            api,
            channel,
            room,
            store: MessageStore::new(),
            user_id: user_id.to_string(),
            conversation: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Open (or switch to) the conversation with `partner_id`. Leaves any
    /// previous room first, resolves the chat via idempotent create-or-get,
    /// loads history, then joins the room. History lands before the join,
    /// so no live event can race the wholesale replace.
    ///
    /// On failure the session returns to `Idle` with an empty store; there
    /// is no automatic retry.
    pub async fn open(
        &mut self,
        partner_id: &str,
        order_id: Option<&str>,
        chat_type: ChatType,
    ) -> Result<()> {
        self.room.leave()?;
        self.conversation = None;
        self.state = SessionState::Resolving;

        let conversation = match self
            .api
            .create_or_get_chat(&self.user_id, partner_id, order_id, chat_type)
            .await
        {
            Ok(conversation) => conversation,
            Err(err) => {
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        let generation = self.store.begin_conversation(&conversation.id);
        let history = match self.api.messages(&conversation.id).await {
            Ok(history) => history,
            Err(err) => {
                self.state = SessionState::Idle;
                return Err(err);
            }
        };
        self.attach(conversation, generation, history)
    }

    /// Bind a resolved conversation: apply its history, then join its room.
    fn attach(
        &mut self,
        conversation: Conversation,
        generation: u64,
        history: Vec<Message>,
    ) -> Result<()> {
        self.store.replace_history(generation, history);
        self.room.join(&conversation.id)?;
        self.conversation = Some(conversation);
        self.state = SessionState::Joined;
        Ok(())
    }

    /// Send `text` to the counterparty. Whitespace-only input is rejected
    /// locally with no emission and no store change; returns whether
    /// anything was sent. The entry stays `Pending` until its echo arrives.
    pub fn send(&mut self, text: &str) -> Result<bool> {
        let body = text.trim();
        if body.is_empty() {
            return Ok(false);
        }
        let Some(conversation) = &self.conversation else {
            return Err(ChatError::NoActiveConversation);
        };
        let chat_id = conversation.id.clone();
        let receiver_id = conversation.counterpart_of(&self.user_id).to_string();
        self.store
            .push_pending(&chat_id, &self.user_id, &receiver_id, body);
        self.channel.emit(ClientEvent::SendMessage {
            chat_id,
            sender_id: self.user_id.clone(),
            receiver_id,
            message: body.to_string(),
        })?;
        Ok(true)
    }

    /// Feed one event from the live channel into the view. Messages for
    /// conversations other than the open one are ignored.
    pub fn handle_event(&mut self, event: &ServerEvent) {
        if let ServerEvent::NewMessage(message) = event {
            match &self.conversation {
                Some(conversation) if conversation.id == message.chat_id => {
                    self.store.append_live(message.clone());
                }
                _ => log::debug!("ignoring message for unopened chat {}", message.chat_id),
            }
        }
    }

    /// Mark sends that have waited longer than `max_age` for an echo as
    /// failed.
    pub fn reap_pending(&mut self, max_age: Duration) -> usize {
        self.store.reap_pending(max_age)
    }

    /// Tear the view down: leave the room and drop the conversation state.
    pub fn close(&mut self) -> Result<()> {
        self.room.leave()?;
        self.store.clear();
        self.conversation = None;
        self.state = SessionState::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::Delivery;
    use crate::chat::testutil::RecordingChannel;
    use crate::config::ChatConfig;

    fn session(channel: Arc<RecordingChannel>) -> ChatSession {
        let config = ChatConfig {
            api_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 1,
            ..ChatConfig::default()
        };
        let api = ApiClient::new(&config).unwrap();
        ChatSession::new(api, channel, "me")
    }

    fn conversation(id: &str, partner_id: &str) -> Conversation {
        Conversation {
            id: id.into(),
            user_one_id: "me".into(),
            user_two_id: partner_id.into(),
            order_id: None,
            chat_type: ChatType::General,
            created_at: String::new(),
        }
    }

    fn echo(id: &str, chat_id: &str, sender_id: &str, body: &str) -> ServerEvent {
        ServerEvent::NewMessage(Message {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            receiver_id: "other".into(),
            message: body.into(),
            created_at: String::new(),
        })
    }

    fn attach(session: &mut ChatSession, conversation: Conversation, history: Vec<Message>) {
        let generation = session.store.begin_conversation(&conversation.id);
        session.attach(conversation, generation, history).unwrap();
    }

    #[test]
    fn empty_conversation_send_and_echo_end_to_end() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel.clone());
        attach(&mut session, conversation("chat_123", "u2"), Vec::new());
        assert_eq!(session.state(), SessionState::Joined);
        assert!(session.store().is_empty());

        assert!(session.send("Hello").unwrap());
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().entries()[0].delivery, Delivery::Pending);
        assert_eq!(session.store().entries()[0].message.sender_id, "me");
        assert_eq!(
            channel.emitted(),
            vec![
                ClientEvent::JoinRoom {
                    chat_id: "chat_123".into()
                },
                ClientEvent::SendMessage {
                    chat_id: "chat_123".into(),
                    sender_id: "me".into(),
                    receiver_id: "u2".into(),
                    message: "Hello".into(),
                },
            ]
        );

        // The echo confirms the pending entry instead of duplicating it.
        session.handle_event(&echo("m1", "chat_123", "me", "Hello"));
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().entries()[0].delivery, Delivery::Confirmed);

        // A replayed echo changes nothing.
        session.handle_event(&echo("m1", "chat_123", "me", "Hello"));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn whitespace_only_text_is_rejected_locally() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel.clone());
        assert!(!session.send("").unwrap());
        assert!(!session.send("   ").unwrap());
        assert!(channel.emitted().is_empty());
        assert!(session.store().is_empty());
    }

    #[test]
    fn send_without_an_open_conversation_fails() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel);
        assert!(matches!(
            session.send("hello"),
            Err(ChatError::NoActiveConversation)
        ));
    }

    #[test]
    fn switching_conversations_leaves_the_old_room_first() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel.clone());
        attach(&mut session, conversation("chat_a", "u2"), Vec::new());
        attach(&mut session, conversation("chat_b", "u3"), Vec::new());

        assert_eq!(
            channel.emitted(),
            vec![
                ClientEvent::JoinRoom {
                    chat_id: "chat_a".into()
                },
                ClientEvent::LeaveRoom {
                    chat_id: "chat_a".into()
                },
                ClientEvent::JoinRoom {
                    chat_id: "chat_b".into()
                },
            ]
        );
        assert_eq!(session.conversation().map(|c| c.id.as_str()), Some("chat_b"));
    }

    #[test]
    fn reopening_the_same_conversation_joins_once() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel.clone());
        attach(&mut session, conversation("chat_1", "u2"), Vec::new());
        attach(&mut session, conversation("chat_1", "u2"), Vec::new());

        let joins = channel
            .emitted()
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::JoinRoom { .. }))
            .count();
        assert_eq!(joins, 1);

        // One pushed message lands exactly once.
        session.handle_event(&echo("m1", "chat_1", "u2", "hi"));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn messages_for_other_conversations_are_ignored() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel);
        attach(&mut session, conversation("chat_1", "u2"), Vec::new());
        session.handle_event(&echo("m1", "chat_2", "u9", "wrong room"));
        assert!(session.store().is_empty());
    }

    #[test]
    fn close_leaves_the_room_and_resets_state() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel.clone());
        attach(&mut session, conversation("chat_1", "u2"), Vec::new());
        session.close().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.conversation().is_none());
        assert!(session.store().is_empty());
        assert_eq!(
            channel.emitted().last(),
            Some(&ClientEvent::LeaveRoom {
                chat_id: "chat_1".into()
            })
        );
    }

    #[test]
    fn unechoed_send_eventually_fails() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session(channel);
        attach(&mut session, conversation("chat_1", "u2"), Vec::new());
        session.send("are you there?").unwrap();
        assert_eq!(session.reap_pending(Duration::ZERO), 1);
        assert_eq!(session.store().entries()[0].delivery, Delivery::Failed);
    }
}
