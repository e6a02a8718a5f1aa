use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(me))
        .route("/capabilities", get(capabilities))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Capabilities {
    is_admin: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(flatten)]
    user: AuthUser,
    is_admin: bool,
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let is_admin = state.data()?.admin.is_admin(&user.id).await?;
    Ok(ok(MeResponse { user, is_admin }))
}

async fn capabilities(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let is_admin = state.data()?.admin.is_admin(&user.id).await?;
    Ok(ok(Capabilities { is_admin }))
}
