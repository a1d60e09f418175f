//! Conversation history for the interactive chat.

use crate::provider::{ChatMessage, Role};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise assistant.";

/// System prompt plus the user/assistant turns that follow it.
#[derive(Debug, Clone)]
pub struct Session {
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

impl Session {
    /// Start a conversation; a blank prompt falls back to the default.
    pub fn new(system_prompt: &str) -> Self {
        let prompt = system_prompt.trim();
        let system_prompt = if prompt.is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            prompt.to_string()
        };

        let mut session = Self {
            system_prompt,
            messages: Vec::new(),
        };
        session.reset();
        session
    }

    pub fn add_user(&mut self, content: &str) {
        self.push(Role::User, content);
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: &str) {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return;
        }
        self.messages.push(ChatMessage {
            role,
            content: trimmed.to_string(),
        });
    }

    /// Drop the last message if it is an unanswered user turn.
    pub fn remove_last_user_message(&mut self) {
        if self.messages.last().is_some_and(|m| m.role == Role::User) {
            self.messages.pop();
        }
    }

    /// Forget all turns, keeping the system prompt.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::system(self.system_prompt.clone())];
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}
