use common::models::SignalStats;
use sqlx::SqlitePool;
use thiserror::Error;

pub mod db;
pub mod hash;
pub mod repositories;

use repositories::security_repo::SecurityLogRepository;
use repositories::signals_repo::SignalRepository;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Aggregate counters consumed by the dashboard.
pub async fn dashboard_stats(pool: &SqlitePool) -> Result<SignalStats, StorageError> {
    let (total_signals, buy_signals, sell_signals) = SignalRepository::counts(pool).await?;
    let critical_alerts = SecurityLogRepository::critical_count(pool).await?;
    Ok(SignalStats {
        total_signals,
        buy_signals,
        sell_signals,
        critical_alerts,
    })
}
