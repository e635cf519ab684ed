use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::data::health::StorageHealth;
use crate::data::repositories::postgres::timed;
use crate::domain::error::DomainError;
use crate::infrastructure::settings::Settings;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn create_pool(database_url: &str, settings: &Settings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!(
        max_connections = settings.db_max_connections,
        "database pool created"
    );
    Ok(pool)
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply database migrations")?;
    info!("database migrations applied");
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct PgHealthCheck {
    pool: PgPool,
    timeout: Duration,
}

impl PgHealthCheck {
    pub(crate) fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl StorageHealth for PgHealthCheck {
    async fn ping(&self) -> Result<(), DomainError> {
        timed(self.timeout, sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}
