use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::response::{json_or_default, AppError};
use crate::services::chat::ChatRequest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    message: String,
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_or_default(body)?;
    let message = state.chat().reply(request).await?;
    Ok(Json(ChatResponse {
        success: true,
        message,
    }))
}
