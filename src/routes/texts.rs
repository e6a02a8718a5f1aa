use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::badges::record;
use crate::auth::AuthUser;
use crate::db::operations::texts;
use crate::db::rows::PersonalText;
use crate::response::{ok, AppError};
use crate::services::badge::{BadgeEvent, BadgeStatus};
use crate::services::validation::require_text;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_texts).post(add_text))
        .route("/:id", delete(delete_text))
}

#[derive(Debug, Deserialize)]
struct NewTextBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TextAdded {
    pub text: PersonalText,
    pub new_badges: Vec<BadgeStatus>,
}

async fn list_texts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    Ok(ok(texts::list_texts(&data.db, &user.id).await?))
}

async fn add_text(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewTextBody>,
) -> Result<impl IntoResponse, AppError> {
    let title = require_text("title", &body.title)?;
    let content = require_text("content", &body.content)?;
    let added = save_and_award(&state, &user.id, &title, &content).await?;
    Ok((StatusCode::CREATED, ok(added)))
}

pub(super) async fn save_and_award(
    state: &AppState,
    user_id: &str,
    title: &str,
    content: &str,
) -> Result<TextAdded, AppError> {
    let data = state.data()?;
    let text = texts::insert_text(&data.db, user_id, title, content, Utc::now()).await?;
    let new_badges = record(state, user_id, BadgeEvent::TextsAdded(1)).await;
    Ok(TextAdded { text, new_badges })
}

#[derive(Serialize)]
struct Deleted {
    id: String,
}

async fn delete_text(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    if !texts::delete_text(&data.db, &user.id, &id).await? {
        return Err(AppError::not_found("Text not found"));
    }
    Ok(ok(Deleted { id }))
}
