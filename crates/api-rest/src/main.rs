//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `mural-run`
//! binary is the deployment entrypoint; both boot the same router.

use api_rest::{build_router, AppState};
use mural_core::config::{graffiti_enabled_from_env_value, max_upload_bytes_from_env_value};
use mural_core::{CoreConfig, DEFAULT_CONTENT_DATA_DIR, DEFAULT_MEDIA_DATA_DIR};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the mural REST API server.
///
/// # Environment Variables
/// - `MURAL_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CONTENT_DATA_DIR`: Post/attachment/graffiti record storage
/// - `MEDIA_DATA_DIR`: Content-addressed blob storage
/// - `PUBLIC_BASE_URL`: Base of issued media URLs
/// - `MURAL_MAX_UPLOAD_MB`: Image size cap in megabytes (default: 2)
/// - `GRAFFITI_ENABLED`: Global graffiti render kill-switch (default: on)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the storage directories cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MURAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting mural REST API on {}", addr);

    let content_data_dir = PathBuf::from(
        std::env::var("CONTENT_DATA_DIR").unwrap_or_else(|_| DEFAULT_CONTENT_DATA_DIR.into()),
    );
    let media_dir = PathBuf::from(
        std::env::var("MEDIA_DATA_DIR").unwrap_or_else(|_| DEFAULT_MEDIA_DATA_DIR.into()),
    );
    std::fs::create_dir_all(&content_data_dir)?;
    std::fs::create_dir_all(&media_dir)?;

    let public_base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{}", addr));
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var("MURAL_MAX_UPLOAD_MB").ok())?;
    let graffiti_enabled = graffiti_enabled_from_env_value(std::env::var("GRAFFITI_ENABLED").ok());

    let cfg = Arc::new(CoreConfig::new(
        content_data_dir,
        media_dir,
        public_base_url,
        max_upload_bytes,
        graffiti_enabled,
    )?);

    let app = build_router(AppState { cfg });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
