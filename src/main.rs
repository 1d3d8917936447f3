use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use merch_mocker::{config::Config, gemini::GeminiClient, routes::{self, AppState}, shell::Shell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    if config.gemini.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; image requests will be rejected by the service");
    } else {
        let prefix: String = config.gemini.api_key.chars().take(6).collect();
        tracing::info!("Using API key: {}...", prefix);
    }

    let gemini = GeminiClient::new(&config.gemini)?;
    let state = AppState { shell: Arc::new(Shell::new(Arc::new(gemini))) };
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
