use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::public_texts::{self, PublicTextInput};
use crate::db::rows::Visibility;
use crate::response::{ok, AppError};
use crate::services::validation::{require_text, ValidationError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_texts).post(create_text))
        .route("/:id", put(update_text).delete(delete_text))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicTextBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    visibility: Option<String>,
    #[serde(default)]
    group_ids: Vec<String>,
}

impl PublicTextBody {
    fn into_input(self) -> Result<PublicTextInput, ValidationError> {
        let title = require_text("title", &self.title)?;
        let body = require_text("body", &self.body)?;
        let visibility = match self.visibility.as_deref() {
            None => Visibility::Public,
            Some(raw) => Visibility::parse(raw).ok_or(ValidationError::Invalid {
                field: "visibility",
                reason: "expected public or groups".to_string(),
            })?,
        };

        let mut group_ids: Vec<String> = self
            .group_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        group_ids.sort();
        group_ids.dedup();

        if visibility == Visibility::Groups && group_ids.is_empty() {
            return Err(ValidationError::Invalid {
                field: "groupIds",
                reason: "select at least one group".to_string(),
            });
        }

        Ok(PublicTextInput {
            title,
            body,
            visibility,
            group_ids,
        })
    }
}

#[derive(Serialize)]
struct Deleted {
    id: String,
}

fn text_not_found() -> AppError {
    AppError::not_found("Text not found")
}

async fn list_texts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    Ok(ok(public_texts::list_all(&data.db).await?))
}

async fn create_text(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<PublicTextBody>,
) -> Result<impl IntoResponse, AppError> {
    let input = body.into_input()?;
    let data = state.data()?;
    let text = public_texts::create(&data.db, &admin.id, &input).await?;
    tracing::info!(text_id = %text.id, visibility = input.visibility.as_str(), "public text created");
    Ok((StatusCode::CREATED, ok(text)))
}

async fn update_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PublicTextBody>,
) -> Result<impl IntoResponse, AppError> {
    let input = body.into_input()?;
    let data = state.data()?;
    let text = public_texts::update(&data.db, &id, &input)
        .await?
        .ok_or_else(text_not_found)?;
    Ok(ok(text))
}

async fn delete_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    if !public_texts::delete(&data.db, &id).await? {
        return Err(text_not_found());
    }
    Ok(ok(Deleted { id }))
}
