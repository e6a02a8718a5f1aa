use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::badge::{describe_awards, BadgeEvent, BadgeStatus, UserStats};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_badges))
        .route("/stats", get(stats))
        .route("/seen", post(mark_seen))
}

/// Feeds an event to the evaluator and returns what it earned, ready to show.
pub(super) async fn record(state: &AppState, user_id: &str, event: BadgeEvent) -> Vec<BadgeStatus> {
    describe_awards(&state.badges().record(user_id, event).await)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BadgesData {
    badges: Vec<BadgeStatus>,
    earned_count: usize,
    total_count: usize,
}

async fn list_badges(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let badges = state.badges().overview(&user.id).await?;
    let earned_count = badges.iter().filter(|badge| badge.earned).count();
    Ok(ok(BadgesData {
        total_count: badges.len(),
        earned_count,
        badges,
    }))
}

async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let stats: UserStats = state.badges().stats(&user.id).await?;
    Ok(ok(stats))
}

#[derive(Serialize)]
struct SeenData {
    cleared: usize,
}

async fn mark_seen(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let cleared = state.badges().mark_seen(&user.id).await?;
    Ok(ok(SeenData { cleared }))
}
