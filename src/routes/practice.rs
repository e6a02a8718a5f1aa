use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use super::badges::record;
use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::badge::{BadgeEvent, BadgeStatus};
use crate::services::practice::{
    Advance, AnswerResult, SessionOutcome, SessionView, DEFAULT_SESSION_SIZE,
    REMINDER_SESSION_SIZE,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(current))
        .route("/start", post(start))
        .route("/answer", post(answer))
        .route("/next", post(next))
        .route("/skip", post(skip))
        .route("/know", post(already_know))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    count: Option<usize>,
    /// Opened from a practice reminder.
    #[serde(default)]
    notification: bool,
    #[serde(default)]
    utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    #[serde(default)]
    choice: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerData {
    accepted: bool,
    result: Option<AnswerResult>,
    session: SessionView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepData {
    finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SessionOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    new_badges: Vec<BadgeStatus>,
}

async fn start(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<StartBody>>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let requested = match body.count {
        Some(count) => count,
        None if body.notification => REMINDER_SESSION_SIZE,
        None => DEFAULT_SESSION_SIZE,
    };

    let pool = state.data()?.words.not_learned(&user.id).await?;
    let view = state
        .practice()
        .start(&user.id, pool, requested, body.utc_offset_minutes);

    tracing::debug!(user_id = %user.id, items = view.total_items, "practice session started");
    Ok(ok(view))
}

async fn current(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.practice().view(&user.id)))
}

async fn answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AnswerBody>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.practice().answer(&user.id, &body.choice)?;
    Ok(ok(AnswerData {
        accepted: result.is_some(),
        result,
        session: state.practice().view(&user.id),
    }))
}

async fn next(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let advance = state.practice().next(&user.id)?;
    Ok(ok(step_data(&state, &user.id, advance).await))
}

async fn skip(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let advance = state.practice().skip(&user.id)?;
    Ok(ok(step_data(&state, &user.id, advance).await))
}

async fn already_know(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let advance = state.practice().already_know(&user.id)?;
    Ok(ok(step_data(&state, &user.id, advance).await))
}

async fn step_data(state: &AppState, user_id: &str, advance: Advance) -> StepData {
    match advance {
        Advance::Continue(session) => StepData {
            finished: false,
            session: Some(session),
            summary: None,
            new_badges: Vec::new(),
        },
        Advance::Finished(outcome) => {
            let new_badges = record(
                state,
                user_id,
                BadgeEvent::SessionCompleted {
                    correct: outcome.correct_count,
                    total: outcome.total_count,
                    duration_secs: outcome.elapsed_seconds,
                    local_time: outcome.local_time,
                },
            )
            .await;
            tracing::info!(
                user_id,
                correct = outcome.correct_count,
                total = outcome.total_count,
                "practice session completed"
            );
            StepData {
                finished: true,
                session: None,
                summary: Some(outcome),
                new_badges,
            }
        }
    }
}
