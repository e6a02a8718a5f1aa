use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthUser;
use crate::response::AppError;
use crate::state::AppState;

/// Runs after `require_auth`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = req.extensions().get::<AuthUser>().cloned() else {
        return AppError::unauthorized("Missing auth token").into_response();
    };

    let data = match state.data() {
        Ok(data) => data,
        Err(err) => return err.into_response(),
    };

    match data.admin.is_admin(&user.id).await {
        Ok(true) => next.run(req).await,
        Ok(false) => AppError::forbidden("Admin access required").into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
