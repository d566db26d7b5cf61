use std::sync::Arc;

use anyhow::Context;
use healthbot::{
    config::Config,
    db,
    gemini::GeminiClient,
    relay::ChatRelay,
    routes,
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
    state::AppState,
};
use secrecy::ExposeSecret;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("failed to open database")?;

    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("sessions stored in redis");
            Arc::new(RedisSessionStore::open(url).context("failed to create Redis client")?)
        }
        None => {
            tracing::info!("sessions stored in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    if config.gemini.api_key.expose_secret().is_empty() {
        tracing::warn!("GOOGLE_API_KEY is not set; every chat turn will get the fallback reply");
    }
    let client = GeminiClient::new(config.gemini).context("failed to build HTTP client")?;
    tracing::info!(model = client.model(), "completion client ready");

    let relay = ChatRelay::new(pool.clone(), Arc::new(client));
    let state = AppState::new(pool, sessions, relay, config.session).context("failed to load templates")?;

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.app_address)
        .await
        .with_context(|| format!("failed to bind {}", config.app_address))?;

    tracing::info!("server running on http://{}", config.app_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
