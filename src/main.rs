use lui_catalog::{app::app, config, database::DatabaseManager, is_production, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lui_catalog=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    tracing::info!("Starting catalog API in {:?} mode", config.environment);
    if is_production!() && config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; logins will fail until it is configured");
    }

    let pool = DatabaseManager::connect(&config.database)?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::postgres(pool, config);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
