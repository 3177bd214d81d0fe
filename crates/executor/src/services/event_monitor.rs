use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::actors::{Actor, ActorType, ControlMessage};
use sqlx::SqlitePool;
use storage::StorageError;
use storage::repositories::security_repo::SecurityLogRepository;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::notifier::Notifier;

/// Watches the security log and pushes HIGH/CRITICAL rows to the notifier.
/// Unlike the signal monitor there is no coalescing: every new row is
/// delivered in ascending order, and the cursor advances past each row
/// whether or not its delivery succeeded.
pub struct EventMonitor {
    id: Uuid,
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    shutdown: watch::Receiver<bool>,
    cursor: i64,
    poll_interval: Duration,
    notify_timeout: Duration,
}

impl EventMonitor {
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
            poll_interval: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(10),
        }
    }

    async fn poll_once(&mut self) -> Result<(), StorageError> {
        let rows = SecurityLogRepository::read_since(&self.pool, self.cursor).await?;

        for row in rows {
            self.cursor = row.id;
            if !row.severity.is_alertable() {
                continue;
            }
            match timeout(self.notify_timeout, self.notifier.notify_event(&row)).await {
                Ok(Ok(())) => debug!("delivered security event {}", row.id),
                Ok(Err(e)) => warn!("event delivery failed for row {}: {}", row.id, e),
                Err(_) => warn!("event delivery timed out for row {}", row.id),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Actor for EventMonitor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::EventMonitorActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Starting Security Event Monitor");

        let mut ticker = time::interval(self.poll_interval);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!("event poll failed: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::MockNotifier;
    use common::models::{SecurityEvent, Severity};
    use storage::db::memory_pool;

    async fn append(pool: &SqlitePool, kind: &str, severity: Severity) {
        let event = SecurityEvent::now(kind, "desc", severity);
        SecurityLogRepository::append(pool, &event).await.unwrap();
    }

    fn make_monitor(pool: &SqlitePool, notifier: MockNotifier) -> EventMonitor {
        let (_tx, rx) = watch::channel(false);
        EventMonitor::new(pool.clone(), Arc::new(notifier), rx)
    }

    #[tokio::test]
    async fn delivers_every_alertable_row_in_order() {
        let pool = memory_pool().await.unwrap();
        append(&pool, "A", Severity::High).await;
        append(&pool, "B", Severity::Critical).await;

        let mut mock = MockNotifier::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_notify_event()
            .withf(|event| event.event_type == "A")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_notify_event()
            .withf(|event| event.event_type == "B")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut monitor = make_monitor(&pool, mock);
        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);
    }

    #[tokio::test]
    async fn filters_low_severities_but_advances_past_them() {
        let pool = memory_pool().await.unwrap();
        append(&pool, "startup", Severity::Info).await;
        append(&pool, "command", Severity::Medium).await;

        // No notify_event expectations: a call would panic the mock.
        let mut monitor = make_monitor(&pool, MockNotifier::new());
        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);

        // A later HIGH row is still picked up from the advanced cursor.
        append(&pool, "breach", Severity::High).await;
        let mut mock = MockNotifier::new();
        mock.expect_notify_event()
            .withf(|event| event.event_type == "breach")
            .times(1)
            .returning(|_| Ok(()));
        let mut resumed = make_monitor(&pool, mock);
        resumed.cursor = monitor.cursor;
        resumed.poll_once().await.unwrap();
        assert_eq!(resumed.cursor, 3);
    }

    struct StallingNotifier;

    #[async_trait]
    impl Notifier for StallingNotifier {
        async fn notify_signal(&self, _signal: &common::models::SignalRow) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn notify_event(
            &self,
            _event: &common::models::SecurityEventRow,
        ) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn stalled_delivery_times_out_per_row_and_advances() {
        let pool = memory_pool().await.unwrap();
        append(&pool, "A", Severity::High).await;
        append(&pool, "B", Severity::Critical).await;

        let (_tx, rx) = watch::channel(false);
        let mut monitor = EventMonitor::new(pool.clone(), Arc::new(StallingNotifier), rx);
        monitor.notify_timeout = Duration::from_millis(20);

        // Each stalled row times out independently; the cursor still moves
        // past both and neither is retried.
        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);

        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);
    }

    #[tokio::test]
    async fn failed_delivery_still_advances_per_row() {
        let pool = memory_pool().await.unwrap();
        append(&pool, "A", Severity::High).await;
        append(&pool, "B", Severity::Critical).await;

        let mut mock = MockNotifier::new();
        mock.expect_notify_event()
            .times(2)
            .returning(|_| Err(anyhow::anyhow!("transport down")));

        let mut monitor = make_monitor(&pool, mock);
        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);

        // Lost rows are not retried on the next cycle.
        monitor.poll_once().await.unwrap();
        assert_eq!(monitor.cursor, 2);
    }
}
