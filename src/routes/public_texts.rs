use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Router};

use super::texts::save_and_award;
use crate::auth::AuthUser;
use crate::db::operations::public_texts;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_visible))
        .route("/:id/save", post(save_to_personal))
}

async fn list_visible(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    Ok(ok(public_texts::list_visible(&data.db, &user.id).await?))
}

/// Copies a text the caller can see into their personal texts.
async fn save_to_personal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    let text = public_texts::find_visible(&data.db, &user.id, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Text not found"))?;

    let added = save_and_award(&state, &user.id, &text.title, &text.body).await?;
    Ok((StatusCode::CREATED, ok(added)))
}
