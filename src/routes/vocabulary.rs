use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use super::words::add_and_award;
use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::curated::{CategorySummary, CuratedWord, CATEGORIES, LEVELS};
use crate::services::extractor::ExtractedWord;
use crate::services::word_store::NewWord;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/catalog/:level/:category", get(catalog_list))
        .route("/import", post(import))
        .route("/extract", post(extract))
}

#[derive(Serialize)]
struct CatalogData {
    levels: [&'static str; 3],
    categories: [&'static str; 5],
    lists: Vec<CategorySummary>,
}

async fn catalog(State(state): State<AppState>) -> impl IntoResponse {
    ok(CatalogData {
        levels: LEVELS,
        categories: CATEGORIES,
        lists: state.curated().summary(),
    })
}

#[derive(Serialize)]
struct CatalogList {
    level: String,
    category: String,
    words: Vec<CuratedWord>,
}

fn unknown_list(level: &str, category: &str) -> AppError {
    AppError::not_found(format!("No curated list for {level}/{category}"))
}

async fn catalog_list(
    State(state): State<AppState>,
    Path((level, category)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let words = state
        .curated()
        .select(&level, &category, None)
        .ok_or_else(|| unknown_list(&level, &category))?;
    Ok(ok(CatalogList {
        level,
        category,
        words,
    }))
}

#[derive(Debug, Deserialize)]
struct ImportBody {
    #[serde(default)]
    level: String,
    #[serde(default)]
    category: String,
    words: Option<Vec<String>>,
}

async fn import(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ImportBody>,
) -> Result<impl IntoResponse, AppError> {
    let selected = state
        .curated()
        .select(&body.level, &body.category, body.words.as_deref())
        .ok_or_else(|| unknown_list(&body.level, &body.category))?;

    let batch = selected
        .into_iter()
        .map(|word| NewWord {
            english: word.english,
            armenian: word.armenian,
        })
        .collect();
    let added = add_and_award(&state, &user.id, batch).await?;

    tracing::info!(
        user_id = %user.id,
        level = %body.level,
        category = %body.category,
        count = added.words.len(),
        "curated words imported"
    );
    Ok((StatusCode::CREATED, ok(added)))
}

#[derive(Debug, Deserialize)]
struct ExtractBody {
    #[serde(default)]
    input: String,
}

#[derive(Serialize)]
struct ExtractData {
    words: Vec<ExtractedWord>,
}

async fn extract(
    State(state): State<AppState>,
    Json(body): Json<ExtractBody>,
) -> impl IntoResponse {
    ok(ExtractData {
        words: state.extractor().extract(&body.input),
    })
}
