//! Postgres connection pool and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

use crate::store::StoreError;

/// Connection settings for the persistent backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Tables and indexes, applied idempotently at startup.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          UUID PRIMARY KEY,
        name        VARCHAR(255) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price       NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
        stock       INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
        category    VARCHAR(100) NOT NULL DEFAULT '',
        image_url   VARCHAR(200),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS products_name_idx ON products (name COLLATE "C", id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      VARCHAR(150) NOT NULL,
        email         VARCHAR(254) NOT NULL,
        password_hash TEXT NOT NULL,
        date_joined   TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_username_key ON users (username)",
];

#[instrument(skip(settings), fields(max_connections = settings.max_connections), err)]
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.url)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect to Postgres: {e}")))
}

#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Backend(format!("schema bootstrap failed: {e}")))?;
    }
    tracing::info!(statements = SCHEMA.len(), "database schema ready");
    Ok(())
}
