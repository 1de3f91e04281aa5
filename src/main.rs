use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use cmf_core::CoreConfig;

/// Main entry point for the CMF portal.
///
/// Serves the REST API (with Swagger UI) until Ctrl-C.
///
/// # Environment Variables
/// - `CMF_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CMF_INTAKE_BASE_URL`: base URL of the request-intake API (required)
/// - `CMF_DATA_DIR`: directory for profiles and preferences (default: "portal_data")
/// - `CMF_INTAKE_TIMEOUT_SECS`: optional timeout for intake requests
/// - `CMF_NOTICE_SECS`: how long form notices stay visible (default: 4)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cmf=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CMF_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_env_values(
        std::env::var("CMF_INTAKE_BASE_URL").ok(),
        std::env::var("CMF_DATA_DIR").ok(),
        std::env::var("CMF_INTAKE_TIMEOUT_SECS").ok(),
        std::env::var("CMF_NOTICE_SECS").ok(),
    )?;
    let state = AppState::from_config(&cfg)?;

    tracing::info!("++ Starting CMF REST on {}", rest_addr);
    tracing::info!(
        intake = cfg.intake_base_url(),
        data_dir = %cfg.data_dir().display(),
        "configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
            }
        })
        .await?;

    Ok(())
}
