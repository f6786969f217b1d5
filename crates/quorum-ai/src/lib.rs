//! OpenRouter chat-completions client used by the council engine.
mod openrouter;
mod types;

pub use openrouter::{OpenRouterClient, OpenRouterConfig, DEFAULT_OPENROUTER_API_BASE};
pub use types::{ChatMessage, MessageRole, ModelClient, QuorumAiError};
