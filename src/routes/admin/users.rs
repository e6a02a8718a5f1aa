use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::db::operations::users;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    Ok(ok(users::list_users(&data.db).await?))
}
