use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `MessageRole` values.
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One message in an outbound chat-completions request.
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `QuorumAiError` values.
pub enum QuorumAiError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("request timed out")]
    Timeout,
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for QuorumAiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }
}

#[async_trait]
/// Trait contract for a single-model completion round trip.
///
/// One request, one response, no retries; retry policy belongs to callers
/// that can reason about the whole deliberation.
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, QuorumAiError>;
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, MessageRole};

    #[test]
    fn unit_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, MessageRole::System);
        assert_eq!(ChatMessage::user("b").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("c").role, MessageRole::Assistant);
    }

    #[test]
    fn unit_message_serializes_snake_case_role() {
        let serialized =
            serde_json::to_value(ChatMessage::user("hello")).expect("message must serialize");
        assert_eq!(serialized["role"], "user");
        assert_eq!(serialized["content"], "hello");
    }
}
