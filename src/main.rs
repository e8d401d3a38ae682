//! Main entry point for the mural annotation service.
//!
//! Resolves configuration from the environment once, builds the REST app
//! from `api-rest`, and serves it. Visitor-facing behaviour (permission
//! gating, sanitisation, drawing anchoring) all lives in `mural-core`.

use api_rest::{build_router, AppState};
use mural_core::config::{graffiti_enabled_from_env_value, max_upload_bytes_from_env_value};
use mural_core::{CoreConfig, DEFAULT_CONTENT_DATA_DIR, DEFAULT_MEDIA_DATA_DIR};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Starts the mural REST server on the configured address (default:
/// 0.0.0.0:3000).
///
/// # Environment Variables
/// - `MURAL_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CONTENT_DATA_DIR`: Post/attachment/graffiti record storage (default: "content_data")
/// - `MEDIA_DATA_DIR`: Content-addressed blob storage (default: "media_data")
/// - `PUBLIC_BASE_URL`: Base of issued media URLs (default: derived from the address)
/// - `MURAL_MAX_UPLOAD_MB`: Image size cap in megabytes (default: 2)
/// - `GRAFFITI_ENABLED`: Global graffiti render kill-switch (default: on)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mural=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MURAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting mural REST on {}", addr);

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
