mod bootstrap;
mod health;
mod llm_http;
mod routes;

use anyhow::Result;

use anihan_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use anihan_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before anything touches the engine.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let bind = format!("{}:{}", app.config.server.bind_address, app.config.server.port);

    tracing::info!(
        event_name = "system.server.started",
        deployment = %app.config.engine.deployment,
        bind = %bind,
        "anihan conversation engine listening"
    );

    let router = routes::router(app.state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
