use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use threadchat_backend::app;
use threadchat_backend::config::AppConfig;
use threadchat_backend::logging::{self, LoggingConfig};
use threadchat_backend::services::llm_service::{EnvSwitch, ModelRouter};
use threadchat_backend::services::quota_service::SystemClock;
use threadchat_backend::state::{AppParts, AppState};
use threadchat_backend::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let store = Arc::new(PgStore::new(pool));
    let router = ModelRouter::from_config(&config.llm, Arc::new(EnvSwitch))
        .context("failed to build LLM HTTP client")?;
    tracing::info!("Model router ready: {:?}", router);

    let state = AppState::new(AppParts {
        chat_store: store.clone(),
        user_store: store,
        router: Arc::new(router),
        clock: Arc::new(SystemClock),
        auth: config.auth.clone(),
        daily_token_limit: config.daily_token_limit,
        title_model: config.llm.title_model.clone(),
    });
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Chat backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
