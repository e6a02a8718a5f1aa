use std::sync::Arc;

use bararan_backend::config::Config;
use bararan_backend::db::Database;
use bararan_backend::logging;
use bararan_backend::state::AppState;
use bararan_backend::workers::ReminderScheduler;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.logging);

    if !config.auth_configured() {
        tracing::warn!("JWT_SECRET not set, authenticated routes will answer 503");
    }

    let db = match Database::connect(&config.database_url).await {
        Ok(db) => Some(db),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized");
            None
        }
    };

    let addr = config.bind_addr();
    let reminder_config = config.reminders.clone();
    let state = match AppState::with_file_badges(config, db) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to build application state");
            std::process::exit(1);
        }
    };

    let scheduler = match state.data_opt() {
        Some(data) => {
            match ReminderScheduler::new(Arc::clone(&data.reminders), reminder_config).await {
                Ok(scheduler) => {
                    if let Err(e) = scheduler.start().await {
                        tracing::error!(error = %e, "failed to start reminder scheduler");
                    }
                    Some(scheduler)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reminder scheduler not initialized");
                    None
                }
            }
        }
        None => None,
    };

    let app = bararan_backend::create_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "bararan-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if let Some(ref scheduler) = scheduler {
        scheduler.stop().await;
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
