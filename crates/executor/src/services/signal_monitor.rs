use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use sqlx::SqlitePool;
use storage::StorageError;
use storage::repositories::signals_repo::SignalRepository;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::notifier::Notifier;

/// Watches the signals table and pushes newly accepted rows to the notifier.
/// Coalescing at-most-once delivery: of all rows past the cursor, only the
/// newest is handed over, and the cursor is never rolled back on failure.
pub struct SignalMonitor {
    id: Uuid,
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    shutdown: watch::Receiver<bool>,
    cursor: i64,
    poll_interval: Duration,
    notify_timeout: Duration,
}

impl SignalMonitor {
    pub fn new(
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pool,
            notifier,
            shutdown,
            cursor: 0,
            poll_interval: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(10),
        }
    }

    /// One poll cycle. A stalled or failed delivery still advances the
    /// cursor: these are best-effort alerts, not a durable queue.
    async fn poll_once(&mut self) -> Result<(), StorageError> {
        let rows = SignalRepository::read_since(&self.pool, self.cursor).await?;
        let Some(newest) = rows.last() else {
            return Ok(());
        };

        self.cursor = newest.id;
        if rows.len() > 1 {
            debug!("coalescing {} new signals into one alert", rows.len());
        }

        match timeout(self.notify_timeout, self.notifier.notify_signal(newest)).await {
            Ok(Ok(())) => debug!("delivered signal row {}", newest.id),
            Ok(Err(e)) => warn!("signal delivery failed for row {}: {}", newest.id, e),
            Err(_) => warn!("signal delivery timed out for row {}", newest.id),
        }
        Ok(())
    }
}

#[async_trait]
impl Actor for SignalMonitor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::SignalMonitorActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Starting Signal Delivery Monitor");

        let mut ticker = time::interval(self.poll_interval);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!("signal poll failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        heartbeat_handle.abort();
                        supervisor_tx.send(ControlMessage::Shutdown(self.id)).await.ok();
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
