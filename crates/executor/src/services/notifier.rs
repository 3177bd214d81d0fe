use async_trait::async_trait;
use chrono::Local;
use common::models::{SecurityEventRow, SignalRow};

/// Seam between the delivery monitors and the outbound transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_signal(&self, signal: &SignalRow) -> anyhow::Result<()>;
    async fn notify_event(&self, event: &SecurityEventRow) -> anyhow::Result<()>;
}

pub fn format_signal_alert(signal: &SignalRow) -> String {
    format!(
        "🚨 NEW SIGNAL ALERT 🚨\n\n\
         📍 Channel: {}\n\
         💱 Pair: {}\n\
         {} Direction: {}\n\n\
         📊 Entry: {}\n\
         🛑 Stop Loss: {}\n\n\
         📈 Take Profits:\n\
         TP1: {}\n\
         TP2: {}\n\
         TP3: {}\n\n\
         ⏰ Time: {}",
        signal.channel,
        signal.pair.as_deref().unwrap_or("N/A"),
        match signal.direction {
            Some(common::models::Direction::Buy) => "🟢",
            _ => "🔴",
        },
        signal.direction.map(|d| d.as_str()).unwrap_or("N/A"),
        signal.entry.as_deref().unwrap_or("N/A"),
        signal.sl.as_deref().unwrap_or("N/A"),
        signal.tp(1).unwrap_or("N/A"),
        signal.tp(2).unwrap_or("N/A"),
        signal.tp(3).unwrap_or("N/A"),
        signal.timestamp,
    )
}

pub fn format_event_alert(event: &SecurityEventRow) -> String {
    format!(
        "🚨 SECURITY ALERT [{}] 🚨\n\n\
         Type: {}\n\
         Description: {}\n\n\
         ⏰ {}",
        event.severity.as_str(),
        event.event_type,
        event.description,
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    )
}
