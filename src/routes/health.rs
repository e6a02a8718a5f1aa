use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    database: &'static str,
    configured: Configured,
}

#[derive(Serialize)]
struct Configured {
    auth: bool,
    translate: bool,
    chat: bool,
}

async fn root(State(state): State<AppState>) -> Response {
    let database = match state.data_opt() {
        Some(data) if data.db.ping().await => "connected",
        Some(_) => "disconnected",
        None => "not_configured",
    };
    let ok = database == "connected";

    let response = HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        uptime_seconds: state.uptime_seconds(),
        database,
        configured: Configured {
            auth: state.config().auth_configured(),
            translate: state.translation().is_configured(),
            chat: state.chat().is_configured(),
        },
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" }))).into_response()
}
