use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TranslateConfig;
use crate::response::AppError;
use crate::services::validation::{require_text, ValidationError};

const DEFAULT_SOURCE: &str = "auto";
const DEFAULT_TARGET: &str = "hy";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("GOOGLE_TRANSLATE_API_KEY is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl From<TranslateError> for AppError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::Validation(err) => err.into(),
            TranslateError::NotConfigured => {
                AppError::config(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            TranslateError::Upstream { status, message } => AppError::upstream(status, message),
            TranslateError::Request(_) | TranslateError::Malformed(_) => {
                AppError::upstream(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: Option<GoogleData>,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    #[serde(default)]
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: Option<String>,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: Option<String>,
}

/// Stateless proxy to the translation provider. Failures are reported once,
/// never retried.
#[derive(Clone)]
pub struct TranslationGateway {
    config: TranslateConfig,
    client: reqwest::Client,
}

impl TranslationGateway {
    pub fn new(config: TranslateConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn translate(&self, request: TranslateRequest) -> Result<Translation, TranslateError> {
        let text = require_text("text", request.text.as_deref().unwrap_or_default())?;
        let source = request
            .source
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SOURCE)
            .to_string();
        let target = match request.target.as_deref() {
            None => DEFAULT_TARGET.to_string(),
            Some(target) => require_text("target", target)?,
        };

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranslateError::NotConfigured)?;

        let payload = serde_json::json!({
            "q": text,
            "source": source,
            "target": target,
            "format": "text",
            "model": "nmt",
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<GoogleErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "Google API error".to_string());
            tracing::warn!(%status, error = %message, "translation upstream rejected request");
            return Err(TranslateError::Upstream {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            });
        }

        let body: GoogleResponse = serde_json::from_slice(&bytes)
            .map_err(|err| TranslateError::Malformed(err.to_string()))?;
        let first = body
            .data
            .and_then(|data| data.translations.into_iter().next())
            .ok_or_else(|| TranslateError::Malformed("no translations".to_string()))?;
        let translated_text = first
            .translated_text
            .ok_or_else(|| TranslateError::Malformed("missing translatedText".to_string()))?;

        Ok(Translation {
            translated_text,
            detected: first.detected_source_language,
        })
    }
}
