use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod metrics;
mod summarizer;

use api::build_router;
use app_state::AppState;
use config::load_settings;
use summarizer::ChatCompletionsProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    if settings.llm_api_key.is_none() {
        warn!("PERPLEXITY_API_KEY is not set; /summarize will answer 503 until it is configured");
    }

    let state = AppState {
        provider: Arc::new(ChatCompletionsProvider::from_settings(&settings)),
        max_body_bytes: settings.max_body_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, model = %settings.llm_model, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
