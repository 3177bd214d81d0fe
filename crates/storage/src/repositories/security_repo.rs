use common::models::{SecurityEvent, SecurityEventRow, Severity};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::StorageError;

pub struct SecurityLogRepository;

impl SecurityLogRepository {
    /// Append-only, no dedup: every call stores a new row.
    pub async fn append(pool: &SqlitePool, event: &SecurityEvent) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO security_logs (event_type, description, timestamp, severity)
                VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(&event.timestamp)
        .bind(event.severity.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn read_recent(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<SecurityEventRow>, StorageError> {
        let rows = sqlx::query("SELECT * FROM security_logs ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(to_event_row).collect())
    }

    pub async fn read_since(
        pool: &SqlitePool,
        cursor: i64,
    ) -> Result<Vec<SecurityEventRow>, StorageError> {
        let rows = sqlx::query("SELECT * FROM security_logs WHERE id > ? ORDER BY id ASC")
            .bind(cursor)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(to_event_row).collect())
    }

    pub async fn critical_count(pool: &SqlitePool) -> Result<i64, StorageError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM security_logs WHERE severity = 'CRITICAL'",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

fn to_event_row(row: SqliteRow) -> SecurityEventRow {
    SecurityEventRow {
        id: row.get("id"),
        event_type: row.get("event_type"),
        description: row.get("description"),
        severity: Severity::from_db(row.get::<String, _>("severity").as_str())
            .unwrap_or(Severity::Info),
        timestamp: row.get("timestamp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn append_never_dedups() {
        let pool = memory_pool().await.unwrap();
        let event = SecurityEvent::now("COMMAND_DETECTED", "same thing twice", Severity::Medium);

        SecurityLogRepository::append(&pool, &event).await.unwrap();
        SecurityLogRepository::append(&pool, &event).await.unwrap();

        let rows = SecurityLogRepository::read_since(&pool, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 2);
    }

    #[tokio::test]
    async fn read_since_orders_ascending() {
        let pool = memory_pool().await.unwrap();
        for (kind, sev) in [
            ("BOT_STARTED", Severity::Info),
            ("COMMAND_DETECTED", Severity::Medium),
            ("INTRUSION", Severity::Critical),
        ] {
            let event = SecurityEvent::now(kind, "desc", sev);
            SecurityLogRepository::append(&pool, &event).await.unwrap();
        }

        let rows = SecurityLogRepository::read_since(&pool, 1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event_type, "COMMAND_DETECTED");
        assert_eq!(rows[1].event_type, "INTRUSION");
        assert_eq!(rows[1].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn critical_count_counts_only_critical() {
        let pool = memory_pool().await.unwrap();
        for sev in [Severity::Info, Severity::High, Severity::Critical] {
            let event = SecurityEvent::now("EVENT", "desc", sev);
            SecurityLogRepository::append(&pool, &event).await.unwrap();
        }
        assert_eq!(
            SecurityLogRepository::critical_count(&pool).await.unwrap(),
            1
        );
    }
}
