use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::{ChatMessage, ModelClient, QuorumAiError};

pub const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone)]
/// Connection settings for the OpenRouter chat-completions endpoint.
pub struct OpenRouterConfig {
    pub api_base: String,
    pub api_key: String,
    pub http_referer: Option<String>,
    pub x_title: Option<String>,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_OPENROUTER_API_BASE.to_string(),
            api_key: api_key.into(),
            http_referer: None,
            x_title: None,
        }
    }

    /// Reads settings from the environment; `OPENROUTER_API_KEY` is required.
    pub fn from_env() -> Result<Self, QuorumAiError> {
        let api_key = non_empty_env_var("OPENROUTER_API_KEY").ok_or(QuorumAiError::MissingApiKey)?;
        Ok(Self {
            api_base: non_empty_env_var("QUORUM_OPENROUTER_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_API_BASE.to_string()),
            api_key,
            http_referer: non_empty_env_var("QUORUM_OPENROUTER_HTTP_REFERER"),
            x_title: non_empty_env_var("QUORUM_OPENROUTER_X_TITLE"),
        })
    }
}

#[derive(Debug, Clone)]
/// Thin OpenRouter client: one POST per completion, timeout supplied per call.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_base: String,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, QuorumAiError> {
        if config.api_key.trim().is_empty() {
            return Err(QuorumAiError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| QuorumAiError::InvalidHeader(format!("API key: {e}")))?,
        );

        if let Some(title) = &config.x_title {
            headers.insert(
                "X-Title",
                HeaderValue::from_str(title)
                    .map_err(|e| QuorumAiError::InvalidHeader(format!("X-Title: {e}")))?,
            );
        }
        if let Some(referer) = &config.http_referer {
            headers.insert(
                "HTTP-Referer",
                HeaderValue::from_str(referer)
                    .map_err(|e| QuorumAiError::InvalidHeader(format!("HTTP-Referer: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(QuorumAiError::Http)?;

        Ok(Self {
            client,
            api_base: config.api_base,
        })
    }

    fn chat_completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            return base.to_string();
        }

        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, QuorumAiError> {
        let body = json!({
            "model": model,
            "messages": messages,
        });

        let response = self
            .client
            .post(self.chat_completions_url())
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuorumAiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        parse_chat_response(&raw)
    }
}

fn parse_chat_response(raw: &str) -> Result<String, QuorumAiError> {
    let parsed: OpenRouterChatResponse = serde_json::from_str(raw)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuorumAiError::InvalidResponse("no choices in response".to_string()))?;

    Ok(choice.message.content.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct OpenRouterChatResponse {
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoiceMessage {
    content: Option<String>,
}
