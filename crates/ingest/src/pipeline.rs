use common::models::{SecurityEvent, Severity};
use sqlx::SqlitePool;
use storage::StorageError;
use storage::repositories::security_repo::SecurityLogRepository;
use storage::repositories::signals_repo::SignalRepository;
use thiserror::Error;
use tracing::{info, warn};

use crate::extractor;
use crate::signal_file::SignalFileWriter;

/// Outcome of one inbound message. The first two are normal negative
/// results, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Accepted,
    Duplicate,
    NotASignal,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// The synchronous extraction-and-insert path, invoked once per inbound
/// channel message.
pub struct Ingestor {
    pool: SqlitePool,
    writer: SignalFileWriter,
}

impl Ingestor {
    pub fn new(pool: SqlitePool, writer: SignalFileWriter) -> Self {
        Self { pool, writer }
    }

    pub async fn handle_message(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<Ingested, IngestError> {
        // Channels don't normally carry bot commands; flag them.
        if text.starts_with('/') {
            let event = SecurityEvent::now(
                "COMMAND_DETECTED",
                &format!("Unusual command in {}", channel),
                Severity::Medium,
            );
            SecurityLogRepository::append(&self.pool, &event).await?;
        }

        let Some(record) = extractor::extract(text, channel) else {
            return Ok(Ingested::NotASignal);
        };
        if !record.is_persistable() {
            return Ok(Ingested::NotASignal);
        }

        if SignalRepository::insert_if_absent(&self.pool, &record).await? {
            info!(
                "signal saved: {} {} @ {} from {}",
                record.pair.as_deref().unwrap_or("?"),
                record.direction.map(|d| d.as_str()).unwrap_or("?"),
                record.entry.as_deref().unwrap_or("?"),
                channel
            );
            // Side-channel write is best effort; the signal is already
            // durably stored.
            if let Err(e) = self.writer.append(&record).await {
                warn!("signal file write failed: {}", e);
            }
            Ok(Ingested::Accepted)
        } else {
            Ok(Ingested::Duplicate)
        }
    }
}
