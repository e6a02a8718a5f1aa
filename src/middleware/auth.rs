use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{extract_token, verify_token};
use crate::db::operations::users;
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(secret) = state.config().jwt_secret.as_deref() else {
        return AppError::config(
            StatusCode::SERVICE_UNAVAILABLE,
            "Authentication is not configured",
        )
        .into_response();
    };

    let Some(token) = extract_token(req.headers()) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing auth token")
            .into_response();
    };

    let user = match verify_token(&token, secret) {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(error = %err, "rejected auth token");
            return json_error(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication failed, please sign in again",
            )
            .into_response();
        }
    };

    if let Some(data) = state.data_opt() {
        if let Err(err) = users::upsert_profile(&data.db, &user.id, user.email.as_deref()).await {
            tracing::warn!(user_id = %user.id, error = %err, "failed to record sign-in");
        }
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}
