use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use jgrants_core::config::load_dotenv;
use jgrants_core::Config;
use jgrants_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::from_env();
    config.log_summary();

    let state = Arc::new(AppState::from_config(&config)?);
    info!(providers = ?state.orchestrator.provider_names(), "orchestrator ready");

    let app = build_router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
