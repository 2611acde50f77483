use crate::model::Message;

/// Sliding window over the most recent user/assistant turns.
///
/// Entries are stored as complete pairs, so the buffer always alternates
/// user, assistant. When a new pair would push the length past `capacity`,
/// the oldest pairs are dropped first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    messages: Vec<Message>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends one turn, evicting the oldest pairs first if it would not fit.
    pub fn push_turn(&mut self, user: Message, assistant: Message) {
        while !self.messages.is_empty() && self.messages.len() + 2 > self.capacity {
            self.messages.drain(..2);
        }
        if self.capacity < 2 {
            return;
        }
        self.messages.push(user);
        self.messages.push(assistant);
    }
}
