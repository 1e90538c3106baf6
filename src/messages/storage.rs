use super::types::ChatMessage;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered conversation with append / remove-last semantics
#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: ChatMessage) {
        self.messages.write().push(message);
    }

    /// Remove and return the most recent message
    pub fn remove_last(&self) -> Option<ChatMessage> {
        self.messages.write().pop()
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.messages.read().last().cloned()
    }

    /// Content of the most recent user message
    pub fn last_user_content(&self) -> Option<String> {
        self.messages
            .read()
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.clone())
    }

    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}
