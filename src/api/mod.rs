//! HTTP API server.

mod auth;
mod media;
pub mod routes;
mod state;
pub mod v1;

#[cfg(test)]
mod auth_test;

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use miette::Diagnostic;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use auth::{CurrentUser, require_token};
pub use media::{MediaKind, MediaStore};
pub use state::AppState;

use crate::db::Database;
use crate::paths::get_media_dir;

/// Environment variable overriding the media directory.
pub const MEDIA_DIR_ENV: &str = "KANBAN_MEDIA_DIR";

const MB: usize = 1024 * 1024;

/// API server errors
#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind to {addr}: {source}")]
    #[diagnostic(code(kanban::api::bind))]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare media directory {path:?}: {source}")]
    #[diagnostic(code(kanban::api::media))]
    Media {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(kanban::api::serve))]
    Serve(#[source] std::io::Error),
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Root directory for uploaded attachments and background images
    pub media_dir: PathBuf,
    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            media_dir: get_media_dir(),
            max_upload_bytes: 10 * MB,
        }
    }
}

impl Config {
    /// Defaults, with the media directory taken from `KANBAN_MEDIA_DIR` when set.
    pub fn new() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var(MEDIA_DIR_ENV) {
            config.media_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_media_dir(mut self, media_dir: PathBuf) -> Self {
        self.media_dir = media_dir;
        self
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(MB);
        self
    }
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kanban=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the API server with the given configuration and database
pub async fn run<D: Database + 'static>(config: Config, db: D) -> Result<(), ApiError> {
    init_tracing();

    tokio::fs::create_dir_all(&config.media_dir)
        .await
        .map_err(|source| ApiError::Media {
            path: config.media_dir.clone(),
            source,
        })?;

    let state = AppState::new(db, MediaStore::new(config.media_dir.clone()));

    let app = routes::create_router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("API server listening on http://{}", addr);
    info!("Serving media from {:?}", config.media_dir);

    axum::serve(listener, app).await.map_err(ApiError::Serve)?;
    Ok(())
}
