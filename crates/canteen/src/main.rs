use anyhow::{Context, Result};
use canteen::{config::Config, handler::AppRouter, state::AppState};
use dotenv::dotenv;
use shared::{config::ConnectionManager, utils::init_logger};
use sqlx::{Pool, Postgres};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let is_dev = std::env::var("DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    let is_enable_file = std::env::var("ENABLE_FILE_LOG")
        .map(|v| v == "true")
        .unwrap_or(false);

    init_logger("canteen", is_dev, is_enable_file);

    let config = Config::init().context("Failed to load configuration")?;

    let db_pool = ConnectionManager::new_pool(
        &config.database_url,
        config.db_min_conn,
        config.db_max_conn,
    )
    .await
    .context("Failed to initialize database pool")?;

    if config.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to migrate database")?;
    }

    let port = config.port;

    let state = AppState::new(db_pool, &config.jwt_secret)
        .await
        .context("Failed to create AppState")?;

    println!("🚀 Server started successfully");

    AppRouter::serve(port, state)
        .await
        .context("Failed to start server")?;

    info!("Shutting down servers...");

    Ok(())
}

async fn run_migrations(pool: &Pool<Postgres>) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}
