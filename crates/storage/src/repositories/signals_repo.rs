use common::models::{Direction, SignalRecord, SignalRow};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::StorageError;
use crate::hash::dedup_key;

pub struct SignalRepository;

impl SignalRepository {
    /// Inserts the record unless a signal with the same (pair, entry)
    /// identity already exists. The check-then-insert runs inside one
    /// transaction; the UNIQUE(signal_hash) constraint backstops the race
    /// between two concurrent inserts of the same key, so exactly one wins.
    pub async fn insert_if_absent(
        pool: &SqlitePool,
        record: &SignalRecord,
    ) -> Result<bool, StorageError> {
        let key = dedup_key(
            record.pair.as_deref().unwrap_or(""),
            record.entry.as_deref().unwrap_or(""),
        );

        let mut tx = pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM signals WHERE signal_hash = ?")
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            info!(
                "duplicate signal suppressed: {} @ {}",
                record.pair.as_deref().unwrap_or("?"),
                record.entry.as_deref().unwrap_or("?")
            );
            return Ok(false);
        }

        let insert = sqlx::query(
            r#"
                INSERT INTO signals (
                    channel_name, pair, direction, entry,
                    tp1, tp2, tp3, tp4, tp5, tp6,
                    sl, leverage, timestamp, date, signal_hash, message_text
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.channel)
        .bind(&record.pair)
        .bind(record.direction.map(|d| d.as_str()))
        .bind(&record.entry)
        .bind(&record.take_profits[0])
        .bind(&record.take_profits[1])
        .bind(&record.take_profits[2])
        .bind(&record.take_profits[3])
        .bind(&record.take_profits[4])
        .bind(&record.take_profits[5])
        .bind(&record.sl)
        .bind(&record.leverage)
        .bind(&record.timestamp)
        .bind(&record.date)
        .bind(&key)
        .bind(&record.raw_text)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => {
                // Lost the race to a concurrent writer of the same key.
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent first.
    pub async fn read_recent(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<SignalRow>, StorageError> {
        let rows = sqlx::query("SELECT * FROM signals ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(to_signal_row).collect())
    }

    /// All rows with id strictly greater than the cursor, ascending by id.
    pub async fn read_since(
        pool: &SqlitePool,
        cursor: i64,
    ) -> Result<Vec<SignalRow>, StorageError> {
        let rows = sqlx::query("SELECT * FROM signals WHERE id > ? ORDER BY id ASC")
            .bind(cursor)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(to_signal_row).collect())
    }

    /// (total, buy, sell)
    pub async fn counts(pool: &SqlitePool) -> Result<(i64, i64, i64), StorageError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM signals")
            .fetch_one(pool)
            .await?;
        let buy =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM signals WHERE direction = 'BUY'")
                .fetch_one(pool)
                .await?;
        let sell =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM signals WHERE direction = 'SELL'")
                .fetch_one(pool)
                .await?;
        Ok((total, buy, sell))
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn to_signal_row(row: SqliteRow) -> SignalRow {
    SignalRow {
        id: row.get("id"),
        channel: row.get("channel_name"),
        pair: row.get("pair"),
        direction: row
            .get::<Option<String>, _>("direction")
            .as_deref()
            .and_then(Direction::from_db),
        entry: row.get("entry"),
        take_profits: [
            row.get("tp1"),
            row.get("tp2"),
            row.get("tp3"),
            row.get("tp4"),
            row.get("tp5"),
            row.get("tp6"),
        ],
        sl: row.get("sl"),
        leverage: row.get("leverage"),
        timestamp: row.get("timestamp"),
        date: row.get("date"),
        dedup_key: row.get("signal_hash"),
        raw_text: row.get("message_text"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn sample_record(pair: &str, entry: &str) -> SignalRecord {
        let mut record = SignalRecord::empty("ChannelA", "raw");
        record.pair = Some(pair.to_string());
        record.direction = Some(Direction::Buy);
        record.entry = Some(entry.to_string());
        record.take_profits[0] = Some("2020".to_string());
        record.sl = Some("2005".to_string());
        record
    }

    #[tokio::test]
    async fn insert_is_idempotent() {
        let pool = memory_pool().await.unwrap();
        let record = sample_record("XAUUSD", "2015.50");

        assert!(SignalRepository::insert_if_absent(&pool, &record)
            .await
            .unwrap());
        assert!(!SignalRepository::insert_if_absent(&pool, &record)
            .await
            .unwrap());

        let (total, _, _) = SignalRepository::counts(&pool).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn differing_sl_tp_is_still_a_duplicate() {
        let pool = memory_pool().await.unwrap();
        let first = sample_record("XAUUSD", "2015.50");
        assert!(SignalRepository::insert_if_absent(&pool, &first)
            .await
            .unwrap());

        let mut second = sample_record("XAUUSD", "2015.50");
        second.sl = Some("1990".to_string());
        second.take_profits[0] = Some("2050".to_string());
        second.leverage = Some("20".to_string());
        assert!(!SignalRepository::insert_if_absent(&pool, &second)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn read_since_is_exclusive_and_ascending() {
        let pool = memory_pool().await.unwrap();
        for entry in ["1.0", "2.0", "3.0"] {
            let record = sample_record("EURUSD", entry);
            SignalRepository::insert_if_absent(&pool, &record)
                .await
                .unwrap();
        }

        let rows = SignalRepository::read_since(&pool, 1).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);

        assert!(SignalRepository::read_since(&pool, 3)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn read_recent_is_newest_first_and_bounded() {
        let pool = memory_pool().await.unwrap();
        for entry in ["1.0", "2.0", "3.0"] {
            let record = sample_record("GBPUSD", entry);
            SignalRepository::insert_if_absent(&pool, &record)
                .await
                .unwrap();
        }

        let rows = SignalRepository::read_recent(&pool, 2).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn row_round_trip_preserves_fields() {
        let pool = memory_pool().await.unwrap();
        let mut record = sample_record("XAUUSD", "2015.50");
        record.take_profits[1] = Some("2025".to_string());
        record.leverage = Some("10".to_string());
        SignalRepository::insert_if_absent(&pool, &record)
            .await
            .unwrap();

        let rows = SignalRepository::read_recent(&pool, 1).await.unwrap();
        let row = &rows[0];
        assert_eq!(row.pair.as_deref(), Some("XAUUSD"));
        assert_eq!(row.direction, Some(Direction::Buy));
        assert_eq!(row.entry.as_deref(), Some("2015.50"));
        assert_eq!(row.tp(1), Some("2020"));
        assert_eq!(row.tp(2), Some("2025"));
        assert_eq!(row.tp(3), None);
        assert_eq!(row.sl.as_deref(), Some("2005"));
        assert_eq!(row.leverage.as_deref(), Some("10"));
        assert_eq!(row.dedup_key.len(), 64);
    }

    #[tokio::test]
    async fn counts_by_direction() {
        let pool = memory_pool().await.unwrap();
        let mut buy = sample_record("XAUUSD", "2015.50");
        buy.direction = Some(Direction::Buy);
        let mut sell = sample_record("BTCUSDT", "61000");
        sell.direction = Some(Direction::Sell);
        let mut unknown = sample_record("ETHUSDT", "2400");
        unknown.direction = None;

        for record in [&buy, &sell, &unknown] {
            SignalRepository::insert_if_absent(&pool, record)
                .await
                .unwrap();
        }

        let (total, buys, sells) = SignalRepository::counts(&pool).await.unwrap();
        assert_eq!((total, buys, sells), (3, 1, 1));
    }
}
