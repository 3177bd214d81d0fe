pub mod security;
pub mod signal;
pub mod stats;

pub use security::{SecurityEvent, SecurityEventRow, Severity};
pub use signal::{Direction, SignalRecord, SignalRow};
pub use stats::{HealthStatus, SignalStats};
