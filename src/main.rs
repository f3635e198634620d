mod config;
mod error;
mod llm;
mod models;
mod orchestration;
mod routes;
mod state;
mod tools;

#[cfg(test)]
mod testing;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("whisperme_relay=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        model = %config.default_model,
        max_tokens = config.generation.max_tokens,
        temperature = config.generation.temperature,
        "starting whisperme relay"
    );

    let state = AppState::init(&config)?;
    let app = routes::router(state, &config.cors_origins);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
