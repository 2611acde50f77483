use anyhow::Result;
use tracing::debug;

use crate::config::GenerationParams;
use crate::history::HistoryBuffer;
use crate::model::{ChatRequest, Message};
use crate::transport::CompletionTransport;

/// Per-session chat state: the fixed system message plus recent turns.
pub struct Conversation {
    system_message: Message,
    history: HistoryBuffer,
    generation: GenerationParams,
}

impl Conversation {
    pub fn new(
        system_prompt: impl Into<String>,
        history_length: usize,
        generation: GenerationParams,
    ) -> Self {
        Self {
            system_message: Message::system(system_prompt),
            history: HistoryBuffer::new(history_length),
            generation,
        }
    }

    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    /// System message, then history oldest first, then `user`.
    pub fn build_request(&self, user: &Message) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(self.system_message.clone());
        messages.extend_from_slice(self.history.messages());
        messages.push(user.clone());
        ChatRequest::new(messages, &self.generation)
    }

    /// Sends one user turn and records it. History is left untouched on error.
    pub async fn run_turn<T>(&mut self, transport: &T, user_input: &str) -> Result<String>
    where
        T: CompletionTransport + ?Sized,
    {
        let user = Message::user(user_input);
        let request = self.build_request(&user);
        debug!(
            message_count = request.messages.len(),
            history_len = self.history.len(),
            "dispatching chat completion request"
        );

        let completion = transport.complete(&request).await?;
        let reply = completion.into_first_content()?;

        self.history.push_turn(user, Message::assistant(reply.clone()));
        debug!(
            reply_len = reply.len(),
            history_len = self.history.len(),
            "recorded conversation turn"
        );
        Ok(reply)
    }
}
