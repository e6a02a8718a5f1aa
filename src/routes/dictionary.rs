use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:word", get(lookup))
}

async fn lookup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(word): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.lookup_gate().issue(&user.id);
    let dictionary = state.dictionary();
    let entry = ticket
        .run(dictionary.debounce(), dictionary.lookup(&word))
        .await?;
    Ok(ok(entry))
}
