use crate::error::{DatabaseError, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

/// Pool settings for the QMS store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    /// Read the configuration from the environment.
    ///
    /// `DATABASE_URL` is required; pool sizing falls back to defaults sized
    /// for a short-lived request-serving process.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::InvalidInput("DATABASE_URL is not set".to_string()))?;

        Ok(Self {
            url,
            max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 20),
            min_connections: env_u32("DATABASE_MIN_CONNECTIONS", 5),
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
        })
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Shared handle to the backing store; cheap to clone, one pool behind it.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e| DatabaseError::InvalidInput(format!("Invalid database URL: {}", e)))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
