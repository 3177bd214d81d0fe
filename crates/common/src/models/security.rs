use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "INFO" => Some(Severity::Info),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Only HIGH and CRITICAL events are pushed to the notifier.
    pub fn is_alertable(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// One operational/security observation. Strictly append-only.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub event_type: String,
    pub description: String,
    pub severity: Severity,
    /// Second precision ("%Y-%m-%d %H:%M:%S").
    pub timestamp: String,
}

impl SecurityEvent {
    pub fn now(event_type: &str, description: &str, severity: Severity) -> Self {
        Self {
            event_type: event_type.to_string(),
            description: description.to_string(),
            severity,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityEventRow {
    pub id: i64,
    pub event_type: String,
    pub description: String,
    pub severity: Severity,
    pub timestamp: String,
}
