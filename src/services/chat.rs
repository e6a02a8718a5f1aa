use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChatConfig;
use crate::response::AppError;
use crate::services::validation::{require_text, ValidationError};

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant specializing in Armenian language learning. Help users with vocabulary, grammar, pronunciation, and practice conversations. Be encouraging and provide clear, practical advice.";
const HISTORY_WINDOW: usize = 4;
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("AI service not configured")]
    NotConfigured,
    #[error("Rate limit hit. Please wait a few seconds and try again.")]
    RateLimited,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("AI service error: {0}")]
    Upstream(StatusCode),
    #[error("No response from AI")]
    EmptyResponse,
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(err) => err.into(),
            ChatError::NotConfigured => {
                AppError::config(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ChatError::RateLimited => AppError::upstream(StatusCode::TOO_MANY_REQUESTS, err.to_string()),
            ChatError::Upstream(_) | ChatError::EmptyResponse => {
                AppError::upstream(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ChatError::Request(_) => AppError::upstream(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<ChatMessage>,
}

/// The system prompt, the most recent history, then the user's message.
pub fn build_messages(user_message: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage {
        role: "system".to_string(),
        content: SYSTEM_PROMPT.to_string(),
    });
    messages.extend(recent.iter().cloned());
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user_message.trim().to_string(),
    });
    messages
}

#[derive(Clone)]
pub struct ChatGateway {
    config: ChatConfig,
    client: reqwest::Client,
}

impl ChatGateway {
    pub fn new(config: ChatConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn reply(&self, request: ChatRequest) -> Result<String, ChatError> {
        let user_message = require_text("userMessage", request.user_message.as_deref().unwrap_or_default())?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ChatError::NotConfigured)?;

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": build_messages(&user_message, &request.conversation_history),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("chat upstream rate limited");
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            tracing::warn!(%status, "chat upstream error");
            return Err(ChatError::Upstream(
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            ));
        }

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn keeps_only_last_four_history_messages() {
        let history: Vec<_> = (0..6).map(|i| msg("user", &i.to_string())).collect();
        let messages = build_messages("  barev  ", &history);
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "2");
        assert_eq!(messages[5], msg("user", "barev"));
    }
}
