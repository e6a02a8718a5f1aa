use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::groups;
use crate::response::{ok, AppError};
use crate::services::validation::{non_empty, require_text};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:id", put(update_group).delete(delete_group))
        .route("/:id/members", get(list_members).post(add_member))
        .route("/:id/members/:user_id", delete(remove_member))
        .route("/:id/available-users", get(available_users))
}

#[derive(Debug, Deserialize)]
struct GroupBody {
    #[serde(default)]
    name: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberBody {
    #[serde(default)]
    user_id: String,
}

#[derive(Serialize)]
struct Deleted {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberChange {
    group_id: String,
    user_id: String,
    changed: bool,
}

fn group_not_found() -> AppError {
    AppError::not_found("Group not found")
}

async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    Ok(ok(groups::list_groups(&data.db).await?))
}

async fn create_group(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<GroupBody>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_text("name", &body.name)?;
    let description = non_empty(body.description.as_deref());
    let data = state.data()?;
    let group = groups::create_group(&data.db, &name, description.as_deref(), &admin.id).await?;
    tracing::info!(group_id = %group.id, admin_id = %admin.id, "group created");
    Ok((StatusCode::CREATED, ok(group)))
}

async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GroupBody>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_text("name", &body.name)?;
    let description = non_empty(body.description.as_deref());
    let data = state.data()?;
    let group = groups::update_group(&data.db, &id, &name, description.as_deref())
        .await?
        .ok_or_else(group_not_found)?;
    Ok(ok(group))
}

async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    if !groups::delete_group(&data.db, &id).await? {
        return Err(group_not_found());
    }
    tracing::info!(group_id = %id, "group deleted");
    Ok(ok(Deleted { id }))
}

async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    groups::find_group(&data.db, &id)
        .await?
        .ok_or_else(group_not_found)?;
    Ok(ok(groups::list_members(&data.db, &id).await?))
}

async fn add_member(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<AddMemberBody>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require_text("userId", &body.user_id)?;
    let data = state.data()?;
    groups::find_group(&data.db, &id)
        .await?
        .ok_or_else(group_not_found)?;
    let changed = groups::add_member(&data.db, &id, &user_id, &admin.id).await?;
    Ok(ok(MemberChange {
        group_id: id,
        user_id,
        changed,
    }))
}

async fn remove_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    if !groups::remove_member(&data.db, &id, &user_id).await? {
        return Err(AppError::not_found("Member not found"));
    }
    Ok(ok(MemberChange {
        group_id: id,
        user_id,
        changed: true,
    }))
}

async fn available_users(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.data()?;
    groups::find_group(&data.db, &id)
        .await?
        .ok_or_else(group_not_found)?;
    Ok(ok(groups::available_users(&data.db, &id).await?))
}
