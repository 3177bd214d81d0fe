use std::env;

use common::models::HealthStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for env var {0}")]
    Invalid(&'static str),
}

/// Credentials for the outbound notification transport. Absence disables the
/// delivery subsystem only; ingestion keeps running.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub bot_token: String,
    pub user_id: i64,
}

impl DeliveryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let user_id = env::var("TELEGRAM_USER_ID")
            .map_err(|_| ConfigError::Missing("TELEGRAM_USER_ID"))?
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid("TELEGRAM_USER_ID"))?;
        Ok(Self { bot_token, user_id })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub signal_file: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "signals.db".to_string()),
            signal_file: env::var("SIGNAL_FILE").unwrap_or_else(|_| "SIGNAL_TRADE.txt".to_string()),
        }
    }
}

/// Liveness payload for the external dashboard. Reports configuration
/// presence, never the values themselves.
pub fn health_probe() -> HealthStatus {
    HealthStatus::online(
        env::var("TELEGRAM_BOT_TOKEN").is_ok(),
        env::var("TELEGRAM_USER_ID").is_ok(),
    )
}
