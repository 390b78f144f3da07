use std::sync::Arc;

use portfolio_api::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);

    let (state, pool) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::connect(&config, url).await?;
            db::migrate(&pool).await?;
            tracing::info!("connected to database");
            (AppState::postgres(config.clone(), pool.clone())?, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores, data will not persist");
            (AppState::in_memory(config.clone())?, None)
        }
    };

    app::serve(app::build_app(state), &config).await?;

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }
    Ok(())
}
