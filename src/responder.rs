//! Reply producers
//!
//! Generating assistant replies is the job of an external service. The UI
//! talks to it through [`Responder`]: a request goes out, and a
//! [`ReplyEvent`] comes back on a channel the UI drains each frame.

use crate::messages::{ChatMessage, Role};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// A request for the next assistant message
#[derive(Clone, Debug)]
pub struct ReplyRequest {
    pub request_id: Uuid,
    /// Conversation so far, ending with a user message
    pub history: Vec<ChatMessage>,
}

/// Outcome of a reply request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyEvent {
    Reply { request_id: Uuid, content: String },
    Failed { request_id: Uuid, error: String },
}

impl ReplyEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            ReplyEvent::Reply { request_id, .. } | ReplyEvent::Failed { request_id, .. } => {
                *request_id
            }
        }
    }
}

pub trait Responder: Send {
    /// Start producing a reply. The result is delivered asynchronously.
    fn request(&self, request: ReplyRequest);
}

/// Answers by quoting the last user message after a fixed delay
pub struct EchoResponder {
    delay: Duration,
    events_tx: Sender<ReplyEvent>,
}

impl EchoResponder {
    /// Create the responder and the receiver its replies arrive on
    pub fn new(delay: Duration) -> (Self, Receiver<ReplyEvent>) {
        let (events_tx, events_rx) = unbounded();
        (Self { delay, events_tx }, events_rx)
    }
}

impl Responder for EchoResponder {
    fn request(&self, request: ReplyRequest) {
        let delay = self.delay;
        let events_tx = self.events_tx.clone();

        thread::spawn(move || {
            thread::sleep(delay);

            let event = match request
                .history
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
            {
                Some(question) => ReplyEvent::Reply {
                    request_id: request.request_id,
                    content: echo_reply(&question.content),
                },
                None => ReplyEvent::Failed {
                    request_id: request.request_id,
                    error: "no user message to answer".to_string(),
                },
            };

            debug!("[CHAT] Reply ready for {}", request.request_id);
            let _ = events_tx.send(event);
        });
    }
}

fn echo_reply(question: &str) -> String {
    let quoted: Vec<String> = question.lines().map(|line| format!("> {line}")).collect();
    format!("You said:\n\n{}", quoted.join("\n"))
}
