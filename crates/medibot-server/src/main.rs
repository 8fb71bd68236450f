use std::sync::Arc;

use anyhow::Result;
use medibot_config::RelayConfig;
use medibot_llm::{CompletionSettings, OpenAiProvider};
use medibot_server::{app, cors_layer, ServerState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = RelayConfig::from_env()?;

    if config.api_key.is_none() {
        warn!("OPENAI_API_KEY not configured; chat replies will report a provider failure");
    }

    let settings = config
        .model
        .as_deref()
        .map(CompletionSettings::with_model)
        .unwrap_or_default();
    info!("Using model {}", settings.model);

    let provider = OpenAiProvider::new(
        config.api_key.as_deref(),
        config.api_base.as_deref(),
        settings,
    );
    let state = Arc::new(ServerState::new(Arc::new(provider)));

    let app = app(state, cors_layer(&config.allowed_origin)?);

    info!("Allowing CORS origin {}", config.allowed_origin);
    info!("Starting server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
