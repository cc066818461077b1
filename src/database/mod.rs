use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;

pub mod models;
pub mod repositories;
pub mod time_of_day;
pub mod transaction;
pub mod utils;

/// Opens the pool per `config.db` tuning and applies pending migrations.
pub async fn init_database(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.max_idle_conns)
        .idle_timeout(Duration::from_secs(config.max_idle_time_secs))
        .connect(&config.addr)
        .await?;

    log::info!("running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("migrations complete");

    Ok(pool)
}
