mod admin;
mod badges;
mod chat;
mod dictionary;
mod health;
mod me;
mod practice;
mod public_texts;
mod reminders;
mod texts;
mod translate;
mod vocabulary;
mod words;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::admin::require_admin;
use crate::middleware::auth::require_auth;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let authenticated = Router::new()
        .nest("/api/me", me::router())
        .nest("/api/words", words::router())
        .nest("/api/vocabulary", vocabulary::router())
        .nest("/api/practice", practice::router())
        .nest("/api/badges", badges::router())
        .nest("/api/texts", texts::router())
        .nest("/api/public-texts", public_texts::router())
        .nest("/api/dictionary", dictionary::router())
        .nest("/api/reminders", reminders::router())
        .nest(
            "/api/admin",
            admin::router().layer(middleware::from_fn_with_state(
                state.clone(),
                require_admin,
            )),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // The proxies stay open to unauthenticated callers.
    let proxies = Router::new()
        .nest("/api/translate", translate::router())
        .nest("/api/chat", chat::router());

    Router::new()
        .nest("/health", health::router())
        .merge(proxies)
        .merge(authenticated)
        .fallback(fallback_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}
