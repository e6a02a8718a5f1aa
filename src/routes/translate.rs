use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::response::{json_or_default, AppError};
use crate::services::translation::{TranslateRequest, Translation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(translate))
}

#[derive(Serialize)]
struct TranslateResponse {
    success: bool,
    #[serde(flatten)]
    translation: Translation,
}

async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_or_default(body)?;
    let translation = state.translation().translate(request).await?;
    Ok(Json(TranslateResponse {
        success: true,
        translation,
    }))
}
