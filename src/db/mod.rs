//! Postgres storage for nations, holdings and the action log.

pub mod action_log;
pub mod ledger;
mod migrate;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use migrate::migrate;

/// Open a connection pool for `url`.
pub async fn connect(url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(url).await
}
