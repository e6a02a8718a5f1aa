use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::db::operations::{public_texts as public_text_ops, texts, users as user_ops, words};
use crate::response::{ok, AppError};
use crate::state::AppState;

mod groups;
mod public_texts;
mod users;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .nest("/users", users::router())
        .nest("/groups", groups::router())
        .nest("/public-texts", public_texts::router())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminStats {
    total_users: i64,
    total_words: i64,
    total_texts: i64,
    total_public_texts: i64,
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    let db = &data.db;
    Ok(ok(AdminStats {
        total_users: user_ops::count_users(db).await?,
        total_words: words::count_all_words(db).await?,
        total_texts: texts::count_all_texts(db).await?,
        total_public_texts: public_text_ops::count_all(db).await?,
    }))
}
