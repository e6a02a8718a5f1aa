use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/stream", get(stream))
}

#[derive(Debug, Deserialize)]
struct SettingsBody {
    enabled: bool,
    /// Keeps the stored time when omitted.
    time: Option<String>,
}

async fn get_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.data()?.reminders.settings(&user.id).await?;
    Ok(ok(settings))
}

async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SettingsBody>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    let reminders = &data.reminders;
    let time = match body.time {
        Some(time) => time,
        None => reminders.settings(&user.id).await?.time,
    };
    let settings = reminders.update(&user.id, body.enabled, &time).await?;
    tracing::debug!(user_id = %user.id, enabled = settings.enabled, time = %settings.time, "reminder settings saved");
    Ok(ok(settings))
}

/// Server-sent `reminder` events for the caller. The user counts as listening
/// until the client disconnects.
async fn stream(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    let (receiver, guard) = data.reminders.subscribe(&user.id);
    tracing::debug!(user_id = %user.id, "reminder listener connected");

    let user_id = user.id;
    let events = BroadcastStream::new(receiver).filter_map(move |msg| {
        let _guard = &guard;
        let user_id = user_id.clone();

        async move {
            let reminder = msg.ok().filter(|reminder| reminder.user_id == user_id)?;
            let data = serde_json::to_string(&reminder).ok()?;
            Some(Ok::<Event, Infallible>(Event::default().event("reminder").data(data)))
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
