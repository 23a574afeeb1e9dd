//! Coaching conversation transcript

use serde::Serialize;

/// Shown as the user's message when they ask without typing anything
pub const DEFAULT_QUESTION: &str = "Analyze this position. What are the key ideas and the best plan?";

pub const COACH_UNAVAILABLE: &str = "Sorry, I couldn't reach the coach right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Coach,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn coach(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Coach, text: text.into() }
    }
}

/// Ordered transcript plus a single-flight guard on coaching requests
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    busy: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Drops the transcript and any pending request, leaving an opening coach line.
    pub fn reset(&mut self, intro: impl Into<String>) {
        self.messages = vec![ChatMessage::coach(intro)];
        self.busy = false;
    }

    /// Records the question and marks the session busy.
    ///
    /// Returns `None` if a request is already outstanding. Otherwise returns
    /// the question to send, which is `None` when the default prompt was used.
    pub fn begin(&mut self, question: Option<&str>) -> Option<Option<String>> {
        if self.busy {
            return None;
        }

        let question = question.map(str::trim).filter(|q| !q.is_empty());
        self.messages.push(ChatMessage::user(question.unwrap_or(DEFAULT_QUESTION)));
        self.busy = true;

        Some(question.map(String::from))
    }

    /// Appends the coach reply, or the failure notice, and clears busy.
    pub fn finish<E>(&mut self, reply: Result<String, E>) {
        let text = match reply {
            Ok(advice) => advice,
            Err(_) => COACH_UNAVAILABLE.to_string(),
        };
        self.messages.push(ChatMessage::coach(text));
        self.busy = false;
    }
}
