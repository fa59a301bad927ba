use anyhow::Result;
use prediction_relay::{
    config,
    llm::{OpenAiClient, Predictor},
    server::Server,
};
use std::sync::Arc;
use tracing::{error, info};

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .json()
        .init();

    info!("Starting prediction relay with log level: {}", log_level);

    let client = Arc::new(OpenAiClient::new(&config.llm));
    let predictor = Predictor::from_config(client, &config.llm);
    info!(
        "Relaying to {} with model {}",
        config.llm.base_url,
        predictor.model()
    );

    let server = Server::bind(&config.server, predictor).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received interrupt signal"),
            Err(e) => error!("Failed to listen for interrupt signal: {}", e),
        }
        handle.stop();
    });

    server.run().await?;

    Ok(())
}
