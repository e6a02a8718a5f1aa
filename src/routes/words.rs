use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use super::badges::record;
use crate::auth::AuthUser;
use crate::db::rows::VocabularyEntry;
use crate::response::{ok, AppError};
use crate::services::badge::{BadgeEvent, BadgeStatus};
use crate::services::word_store::{NewWord, WordPatch};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_words).post(add_words))
        .route("/:id", put(update_word).delete(delete_word))
}

#[derive(Debug, Deserialize)]
struct NewWordBody {
    #[serde(default)]
    english: String,
    #[serde(default)]
    armenian: String,
}

/// Either a single word or a batch under `words`.
#[derive(Debug, Deserialize)]
struct AddWordsBody {
    english: Option<String>,
    armenian: Option<String>,
    words: Option<Vec<NewWordBody>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWordBody {
    english: Option<String>,
    armenian: Option<String>,
    is_learned: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WordsAdded {
    pub words: Vec<VocabularyEntry>,
    pub new_badges: Vec<BadgeStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WordUpdated {
    word: VocabularyEntry,
    new_badges: Vec<BadgeStatus>,
}

async fn list_words(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let words = state.data()?.words.list(&user.id).await?;
    Ok(ok(words))
}

async fn add_words(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AddWordsBody>,
) -> Result<impl IntoResponse, AppError> {
    let batch: Vec<NewWord> = match body.words {
        Some(words) => words
            .into_iter()
            .map(|word| NewWord {
                english: word.english,
                armenian: word.armenian,
            })
            .collect(),
        None => vec![NewWord {
            english: body.english.unwrap_or_default(),
            armenian: body.armenian.unwrap_or_default(),
        }],
    };

    let added = add_and_award(&state, &user.id, batch).await?;
    Ok((StatusCode::CREATED, ok(added)))
}

pub(super) async fn add_and_award(
    state: &AppState,
    user_id: &str,
    batch: Vec<NewWord>,
) -> Result<WordsAdded, AppError> {
    let words = state.data()?.words.add(user_id, batch).await?;
    let new_badges = record(state, user_id, BadgeEvent::WordsAdded(words.len() as u32)).await;
    Ok(WordsAdded { words, new_badges })
}

async fn update_word(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateWordBody>,
) -> Result<impl IntoResponse, AppError> {
    let patch = WordPatch {
        english: body.english,
        armenian: body.armenian,
        is_learned: body.is_learned,
    };
    let update = state.data()?.words.update(&user.id, &id, patch).await?;

    let new_badges = if update.became_learned {
        record(&state, &user.id, BadgeEvent::WordsLearned(1)).await
    } else {
        Vec::new()
    };

    Ok(ok(WordUpdated {
        word: update.entry,
        new_badges,
    }))
}

#[derive(Serialize)]
struct Deleted {
    id: String,
}

async fn delete_word(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.data()?.words.delete(&user.id, &id).await?;
    Ok(ok(Deleted { id }))
}
