//! The message log for the current pairing.

use std::sync::Arc;

use parley_protocol::UserId;

/// One chat message. Immutable once in a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who wrote it.
    pub sender: UserId,
    /// The text.
    pub content: String,
}

impl Message {
    /// Creates a message.
    pub fn new(sender: impl Into<UserId>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}

/// Append-only, ordered messages for one pairing.
///
/// Only the session mutates a log. Storage is copy-on-write: a
/// [`snapshot`](Self::snapshot) taken earlier keeps seeing exactly the
/// messages it was taken with.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Vec<Message>>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, message: Message) {
        Arc::make_mut(&mut self.messages).push(message);
    }

    pub(crate) fn clear(&mut self) {
        if !self.messages.is_empty() {
            self.messages = Arc::default();
        }
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The messages in order.
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// A shared, immutable view of the current contents.
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut log = MessageLog::new();
        log.append(Message::new("u1", "hi"));
        log.append(Message::new("u2", "hello"));
        log.append(Message::new("u1", "how are you"));

        let contents: Vec<&str> =
            log.as_slice().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "hello", "how are you"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = MessageLog::new();
        log.append(Message::new("u1", "hi"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_append() {
        let mut log = MessageLog::new();
        log.append(Message::new("u1", "hi"));
        let before = log.snapshot();

        log.append(Message::new("u2", "hello"));

        assert_eq!(before.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_snapshot_unaffected_by_clear() {
        let mut log = MessageLog::new();
        log.append(Message::new("u1", "hi"));
        let before = log.snapshot();

        log.clear();

        assert_eq!(*before, vec![Message::new("u1", "hi")]);
        assert!(log.snapshot().is_empty());
    }
}
