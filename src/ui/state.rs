//! Application state management
//!
//! Conversation state for the chat view and the plumbing to the reply
//! producer.

use crate::messages::{ChatMessage, MessageStorage, Role};
use crate::responder::{ReplyEvent, ReplyRequest, Responder};
use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Central application state
pub struct AppState {
    /// Message storage (thread-safe)
    pub messages: MessageStorage,

    /// Current text input
    pub input_text: String,

    /// A reply is being produced
    pub is_loading: bool,

    /// Last error message
    pub last_error: Option<String>,

    responder: Box<dyn Responder>,
    replies_rx: Receiver<ReplyEvent>,
    pending_reply: Option<Uuid>,
}

impl AppState {
    /// Create the state around a reply producer and the channel it answers on
    pub fn new(responder: Box<dyn Responder>, replies_rx: Receiver<ReplyEvent>) -> Self {
        Self {
            messages: MessageStorage::new(),
            input_text: String::new(),
            is_loading: false,
            last_error: None,
            responder,
            replies_rx,
            pending_reply: None,
        }
    }

    /// Snapshot of the conversation
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.get_all()
    }

    /// Whether the input bar may submit right now
    pub fn can_send(&self) -> bool {
        !self.is_loading && !self.input_text.trim().is_empty()
    }

    /// Append the typed text as a user message and ask for a reply
    pub fn send_message(&mut self) {
        if !self.can_send() {
            return;
        }

        let text = self.input_text.trim().to_string();
        self.input_text.clear();

        info!("[CHAT] User message ({} chars)", text.len());
        self.messages.add(ChatMessage::user(text));
        self.request_reply();
    }

    /// Drop a trailing assistant reply and ask again for the last user
    /// message
    pub fn refresh(&mut self) {
        if self.is_loading {
            return;
        }

        if self.messages.last().is_some_and(|m| m.role == Role::Assistant) {
            self.messages.remove_last();
        }

        if self.messages.last_user_content().is_none() {
            debug!("[CHAT] Nothing to regenerate");
            return;
        }

        info!("[CHAT] Regenerating reply");
        self.request_reply();
    }

    /// Delete the most recent message
    pub fn remove_last(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(removed) = self.messages.remove_last() {
            info!("[CHAT] Removed {} message {}", removed.role, removed.id);
        }
    }

    /// Process replies that arrived since the last frame
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.replies_rx.try_recv() {
            if self.pending_reply != Some(event.request_id()) {
                debug!("[CHAT] Ignoring stale reply {}", event.request_id());
                continue;
            }

            self.pending_reply = None;
            self.is_loading = false;

            match event {
                ReplyEvent::Reply { content, .. } => {
                    self.last_error = None;
                    self.messages.add(ChatMessage::assistant(content));
                }
                ReplyEvent::Failed { error, .. } => {
                    warn!("[CHAT] Reply failed: {}", error);
                    self.last_error = Some(error);
                }
            }
        }
    }

    fn request_reply(&mut self) {
        let request_id = Uuid::new_v4();
        self.pending_reply = Some(request_id);
        self.is_loading = true;

        self.responder.request(ReplyRequest {
            request_id,
            history: self.messages.get_all(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Sender};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records requests; the test answers them through the returned sender
    struct ScriptedResponder {
        requests: Arc<Mutex<Vec<ReplyRequest>>>,
    }

    impl Responder for ScriptedResponder {
        fn request(&self, request: ReplyRequest) {
            self.requests.lock().push(request);
        }
    }

    fn state() -> (AppState, Arc<Mutex<Vec<ReplyRequest>>>, Sender<ReplyEvent>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = unbounded();
        let responder = ScriptedResponder {
            requests: requests.clone(),
        };
        (AppState::new(Box::new(responder), rx), requests, tx)
    }

    fn answer(requests: &Mutex<Vec<ReplyRequest>>, tx: &Sender<ReplyEvent>, content: &str) {
        let request_id = requests.lock().last().map(|r| r.request_id).unwrap();
        tx.send(ReplyEvent::Reply {
            request_id,
            content: content.to_string(),
        })
        .unwrap();
    }

    #[test]
    fn test_send_appends_and_loads() {
        let (mut state, requests, _tx) = state();
        state.input_text = "  hello  ".to_string();

        state.send_message();

        assert!(state.is_loading);
        assert!(state.input_text.is_empty());
        assert_eq!(state.messages.len(), 1);
        assert_eq!(requests.lock()[0].history[0].content, "hello");
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let (mut state, requests, _tx) = state();
        state.input_text = "   ".to_string();
        state.send_message();

        assert!(state.messages.is_empty());
        assert!(requests.lock().is_empty());
    }

    #[test]
    fn test_reply_finishes_loading() {
        let (mut state, requests, tx) = state();
        state.input_text = "hi".to_string();
        state.send_message();

        answer(&requests, &tx, "hello there");
        state.poll_events();

        assert!(!state.is_loading);
        let last = state.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "hello there");
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let (mut state, _requests, tx) = state();
        state.input_text = "hi".to_string();
        state.send_message();

        tx.send(ReplyEvent::Reply {
            request_id: Uuid::new_v4(),
            content: "late".to_string(),
        })
        .unwrap();
        state.poll_events();

        assert!(state.is_loading);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_refresh_replaces_assistant_reply() {
        let (mut state, requests, tx) = state();
        state.input_text = "question".to_string();
        state.send_message();
        answer(&requests, &tx, "first");
        state.poll_events();

        state.refresh();

        assert!(state.is_loading);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(requests.lock().len(), 2);

        answer(&requests, &tx, "second");
        state.poll_events();
        assert_eq!(state.messages.last().unwrap().content, "second");
    }

    #[test]
    fn test_failure_is_recorded() {
        let (mut state, requests, tx) = state();
        state.input_text = "hi".to_string();
        state.send_message();

        let request_id = requests.lock()[0].request_id;
        tx.send(ReplyEvent::Failed {
            request_id,
            error: "offline".to_string(),
        })
        .unwrap();
        state.poll_events();

        assert!(!state.is_loading);
        assert_eq!(state.last_error.as_deref(), Some("offline"));
    }

    #[test]
    fn test_remove_last() {
        let (mut state, _requests, _tx) = state();
        state.messages.add(ChatMessage::user("one"));
        state.messages.add(ChatMessage::assistant("two"));

        state.remove_last();

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages.last().unwrap().content, "one");
    }
}
