use anyhow::Result;
use axum::serve;
use careplan_service::create_app;
use careplan_utils::{init_logging, AppConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    config.validate()?;
    info!(
        llm_enabled = config.llm.enabled,
        min_text_chars = config.extraction.min_text_chars,
        "Starting care planner"
    );

    let app = create_app(&config)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Care planner listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}
