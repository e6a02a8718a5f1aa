use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::config::DictionaryConfig;
use crate::response::{json_error, AppError};
use crate::services::validation::{require_text, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub phonetic: Option<String>,
    pub audio_url: Option<String>,
    pub part_of_speech: Option<String>,
    pub definition: Option<String>,
    pub example: Option<String>,
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Dictionary data not found")]
    NotFound,
    #[error("dictionary returned {0}")]
    Upstream(StatusCode),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("lookup superseded by a newer request")]
    Superseded,
}

impl From<DictionaryError> for AppError {
    fn from(err: DictionaryError) -> Self {
        match err {
            DictionaryError::Validation(err) => err.into(),
            DictionaryError::NotFound => AppError::not_found(err.to_string()),
            DictionaryError::Superseded => {
                json_error(StatusCode::CONFLICT, "SUPERSEDED", err.to_string())
            }
            DictionaryError::Upstream(status) => AppError::upstream(status, err.to_string()),
            DictionaryError::Request(_) => {
                AppError::upstream(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    word: Option<String>,
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<RawPhonetic>,
    #[serde(default)]
    meanings: Vec<RawMeaning>,
}

#[derive(Debug, Deserialize)]
struct RawPhonetic {
    text: Option<String>,
    audio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeaning {
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<RawDefinition>,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    definition: Option<String>,
    example: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl DictionaryEntry {
    fn from_raw(raw: RawEntry, requested: &str) -> Self {
        let phonetic = non_blank(raw.phonetic)
            .or_else(|| raw.phonetics.first().and_then(|p| non_blank(p.text.clone())));
        let audio_url = raw
            .phonetics
            .into_iter()
            .find_map(|p| non_blank(p.audio));
        let meaning = raw.meanings.into_iter().next();
        let part_of_speech = meaning.as_ref().and_then(|m| m.part_of_speech.clone());
        let definition = meaning.and_then(|m| m.definitions.into_iter().next());

        Self {
            word: non_blank(raw.word).unwrap_or_else(|| requested.to_string()),
            phonetic,
            audio_url,
            part_of_speech,
            definition: definition.as_ref().and_then(|d| d.definition.clone()),
            example: definition.and_then(|d| d.example),
        }
    }
}

type LatestLookups = Arc<Mutex<HashMap<String, watch::Sender<u64>>>>;

/// Tracks the latest lookup per user. A newer lookup cancels the older one,
/// whether it is still debouncing or already waiting on the network. A user's
/// entry lives only while their latest ticket does.
#[derive(Default)]
pub struct LookupGate {
    latest: LatestLookups,
}

pub struct LookupTicket {
    user_id: String,
    generation: u64,
    latest: watch::Receiver<u64>,
    gate: LatestLookups,
}

impl LookupGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, user_id: &str) -> LookupTicket {
        let mut latest = self.latest.lock();
        let sender = latest
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(0).0);
        let generation = *sender.borrow() + 1;
        sender.send_replace(generation);
        LookupTicket {
            user_id: user_id.to_string(),
            generation,
            latest: sender.subscribe(),
            gate: Arc::clone(&self.latest),
        }
    }

    pub fn tracked_users(&self) -> usize {
        self.latest.lock().len()
    }
}

impl Drop for LookupTicket {
    fn drop(&mut self) {
        let mut latest = self.gate.lock();
        let owns_entry = latest
            .get(&self.user_id)
            .is_some_and(|sender| *sender.borrow() == self.generation);
        if owns_entry {
            latest.remove(&self.user_id);
        }
    }
}

impl LookupTicket {
    pub fn is_current(&self) -> bool {
        *self.latest.borrow() == self.generation
    }

    async fn superseded(&mut self) {
        loop {
            if *self.latest.borrow_and_update() != self.generation {
                return;
            }
            if self.latest.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Waits out the debounce window, then drives `work`. Either phase is
    /// abandoned as soon as a newer ticket is issued for the same user.
    pub async fn run<F, T>(mut self, debounce: Duration, work: F) -> Result<T, DictionaryError>
    where
        F: Future<Output = Result<T, DictionaryError>>,
    {
        let result = tokio::select! {
            biased;
            _ = self.superseded() => return Err(DictionaryError::Superseded),
            result = async {
                tokio::time::sleep(debounce).await;
                work.await
            } => result,
        };
        if !self.is_current() {
            return Err(DictionaryError::Superseded);
        }
        result
    }
}

#[derive(Clone)]
pub struct DictionaryClient {
    config: DictionaryConfig,
    client: reqwest::Client,
}

impl DictionaryClient {
    pub fn new(config: DictionaryConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn debounce(&self) -> Duration {
        self.config.debounce
    }

    pub async fn lookup(&self, word: &str) -> Result<DictionaryEntry, DictionaryError> {
        let word = require_text("word", word)?;
        let url = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            urlencoding::encode(&word)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DictionaryError::NotFound);
        }
        if !status.is_success() {
            tracing::warn!(%status, word = %word, "dictionary upstream error");
            return Err(DictionaryError::Upstream(
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            ));
        }

        let entries: Vec<RawEntry> = response
            .json()
            .await
            .map_err(|_| DictionaryError::Upstream(StatusCode::BAD_GATEWAY))?;
        entries
            .into_iter()
            .next()
            .map(|raw| DictionaryEntry::from_raw(raw, &word))
            .ok_or(DictionaryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_meaning_and_any_audio() {
        let raw: RawEntry = serde_json::from_value(serde_json::json!({
            "word": "hello",
            "phonetics": [{ "text": "/həˈləʊ/" }, { "audio": "https://a/hello.mp3" }],
            "meanings": [
                { "partOfSpeech": "exclamation",
                  "definitions": [{ "definition": "used as a greeting", "example": "hello there" }] },
                { "partOfSpeech": "noun", "definitions": [{ "definition": "an utterance" }] }
            ]
        }))
        .unwrap();
        let entry = DictionaryEntry::from_raw(raw, "hello");
        assert_eq!(entry.phonetic.as_deref(), Some("/həˈləʊ/"));
        assert_eq!(entry.audio_url.as_deref(), Some("https://a/hello.mp3"));
        assert_eq!(entry.part_of_speech.as_deref(), Some("exclamation"));
        assert_eq!(entry.example.as_deref(), Some("hello there"));
    }

    #[tokio::test]
    async fn newer_ticket_cancels_in_flight_lookup() {
        let gate = std::sync::Arc::new(LookupGate::new());
        let first = gate.issue("u");
        let slow = tokio::spawn(first.run(Duration::ZERO, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, DictionaryError>("stale")
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = gate.issue("u");
        let fresh = second
            .run(Duration::ZERO, async { Ok::<_, DictionaryError>("fresh") })
            .await
            .unwrap();

        assert_eq!(fresh, "fresh");
        assert!(matches!(slow.await.unwrap(), Err(DictionaryError::Superseded)));
        assert_eq!(gate.tracked_users(), 0);
    }

    #[tokio::test]
    async fn finished_lookups_release_their_user() {
        let gate = LookupGate::new();
        let stale = gate.issue("u");
        let fresh = gate.issue("u");
        assert_eq!(gate.tracked_users(), 1);

        drop(stale);
        assert_eq!(gate.tracked_users(), 1);
        assert!(fresh.is_current());

        fresh
            .run(Duration::ZERO, async { Ok::<_, DictionaryError>(()) })
            .await
            .unwrap();
        assert_eq!(gate.tracked_users(), 0);

        let again = gate.issue("u");
        assert!(again.is_current());
        assert_eq!(gate.tracked_users(), 1);
    }

    #[tokio::test]
    async fn tickets_are_per_user() {
        let gate = LookupGate::new();
        let mine = gate.issue("a");
        let _theirs = gate.issue("b");
        assert!(mine.is_current());
        let out = mine
            .run(Duration::from_millis(5), async { Ok::<_, DictionaryError>(1) })
            .await
            .unwrap();
        assert_eq!(out, 1);
    }
}
