//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the portal REST API on its own, without the workspace's `cmf-run` wrapper.
//!
//! ## Intended use
//! Development and debugging with the Swagger UI at `/swagger-ui`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use cmf_core::CoreConfig;

/// Starts the REST API on `CMF_REST_ADDR` (default `0.0.0.0:3000`).
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CMF_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_env_values(
        std::env::var("CMF_INTAKE_BASE_URL").ok(),
        std::env::var("CMF_DATA_DIR").ok(),
        std::env::var("CMF_INTAKE_TIMEOUT_SECS").ok(),
        std::env::var("CMF_NOTICE_SECS").ok(),
    )?;
    let state = AppState::from_config(&cfg)?;

    tracing::info!("-- Starting CMF REST API on {}", addr);
    tracing::info!(
        intake = cfg.intake_base_url(),
        data_dir = %cfg.data_dir().display(),
        "configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
