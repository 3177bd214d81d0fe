use chrono::Local;
use serde::Serialize;

/// Aggregate counters surfaced to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SignalStats {
    pub total_signals: i64,
    pub buy_signals: i64,
    pub sell_signals: i64,
    pub critical_alerts: i64,
}

/// Liveness probe payload: reports whether delivery credentials are set,
/// never their values.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub bot_token_set: bool,
    pub user_id_set: bool,
}

impl HealthStatus {
    pub fn online(bot_token_set: bool, user_id_set: bool) -> Self {
        Self {
            status: "online",
            timestamp: Local::now().to_rfc3339(),
            bot_token_set,
            user_id_set,
        }
    }
}
