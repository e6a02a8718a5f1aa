pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod workers;

use crate::state::AppState;

pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
}
