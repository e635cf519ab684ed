use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use data::repositories::memory::InMemoryStore;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{PgHealthCheck, create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::settings::{Settings, StorageBackend};
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;
    info!(
        backend = ?settings.storage_backend,
        environment = %settings.environment,
        "starting social-server"
    );

    match settings.storage_backend {
        StorageBackend::Postgres => {
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL is required")?;
            let pool = create_pool(database_url, &settings).await?;
            run_migrations(&pool).await?;

            let query_timeout = Duration::from_secs(settings.db_query_timeout_secs);
            let state = AppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone(), query_timeout)),
                Arc::new(PostgresPostRepository::new(pool.clone(), query_timeout)),
                Arc::new(PgHealthCheck::new(pool.clone(), query_timeout)),
                &settings.environment,
            );

            let result = server::run_http(&settings, state).await;
            pool.close().await;
            info!("database pool closed");
            result
        }
        StorageBackend::Memory => {
            warn!("in-memory storage selected, data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            let state = AppState::new(
                store.clone(),
                store.clone(),
                store,
                &settings.environment,
            );
            server::run_http(&settings, state).await
        }
    }
}
