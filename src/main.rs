pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod session;
pub mod validation;
pub mod views;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use clap::Parser;
use config::Config;
use repository::{open_backend, Backend};
use session::SessionStore;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// === App State ===
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn Backend>,
    sessions: SessionStore,
}
impl AppState {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            sessions: SessionStore::default(),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.debug)?;

    let backend = open_backend(config.store, &config.database_path())?;
    let app = app(AppState::new(backend));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("Listening on http://{}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/lists", get(routes::index).post(routes::create_list))
        .route("/lists/new", get(routes::new_list))
        .route(
            "/lists/:id",
            get(routes::show_list).post(routes::rename_list),
        )
        .route("/lists/:id/edit", get(routes::edit_list))
        .route("/lists/:id/delete", post(routes::delete_list))
        .route("/lists/:id/complete_all", post(routes::complete_all))
        .route("/lists/:id/todos", post(routes::create_todo))
        .route("/lists/:id/todos/:todo_id", post(routes::set_todo_status))
        .route("/lists/:id/todos/:todo_id/delete", post(routes::delete_todo))
        .layer(middleware::from_fn(session::ensure_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
