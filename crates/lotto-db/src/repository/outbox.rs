//! # Sync Outbox Repository
//!
//! The retry queue for failed background writes.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  Flush task tries a direct write (box upsert, counter upsert, ...)     │
//! │       │                                                                 │
//! │       ├── success: done, nothing queued                                │
//! │       │                                                                 │
//! │       └── failure:                                                      │
//! │            INSERT INTO sync_outbox (entity_type, entity_id, payload)   │
//! │            VALUES ('BOX', '12', <full box JSON>)                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            OUTBOX PROCESSOR (periodic, lotto-sync)              │   │
//! │  │                                                                 │   │
//! │  │  1. SELECT * FROM sync_outbox WHERE synced_at IS NULL          │   │
//! │  │     AND attempts < MAX  ORDER BY created_at                    │   │
//! │  │                                                                 │   │
//! │  │  2. For each entry: replay the write from its payload          │   │
//! │  │     success: mark_synced   failure: mark_failed (attempts+1)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Writes are upserts keyed by natural identity, so replaying an entry   │
//! │  that actually succeeded the first time is harmless.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use lotto_core::types::SyncOutboxEntry;

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: String,
    owner_id: String,
    entity_type: String,
    entity_id: String,
    payload: String,
    attempts: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    attempted_at: Option<DateTime<Utc>>,
    synced_at: Option<DateTime<Utc>>,
}

impl From<OutboxRow> for SyncOutboxEntry {
    fn from(row: OutboxRow) -> Self {
        SyncOutboxEntry {
            id: row.id,
            owner_id: row.owner_id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            payload: row.payload,
            attempts: row.attempts,
            last_error: row.last_error,
            created_at: row.created_at,
            attempted_at: row.attempted_at,
            synced_at: row.synced_at,
        }
    }
}

/// Repository for sync outbox operations.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: SqlitePool,
}

impl OutboxRepository {
    /// Creates a new OutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutboxRepository { pool }
    }

    /// Parks a failed write for retry.
    ///
    /// ## Arguments
    /// * `entity_type` - "BOX", "GAME", "COUNTER", "SETTINGS", "SUMMARY"
    /// * `entity_id` - natural key of the entity (box number, game number...)
    /// * `payload` - JSON serialization of the full entity
    pub async fn queue(
        &self,
        owner_id: &str,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncOutboxEntry> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(entity_type, entity_id, "Parking entry in sync outbox");

        let entry = SyncOutboxEntry {
            id: id.clone(),
            owner_id: owner_id.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload: payload.to_string(),
            attempts: 0,
            last_error: None,
            created_at: now,
            attempted_at: None,
            synced_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sync_outbox (
                id, owner_id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.owner_id)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.attempted_at)
        .bind(entry.synced_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Pending entries to retry, oldest first.
    ///
    /// Entries at or past `max_attempts` are left parked for manual
    /// inspection rather than retried forever.
    pub async fn pending(&self, limit: u32, max_attempts: i64) -> DbResult<Vec<SyncOutboxEntry>> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT
                id, owner_id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            FROM sync_outbox
            WHERE synced_at IS NULL AND attempts < ?2
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SyncOutboxEntry::from).collect())
    }

    /// Marks an entry as successfully replayed.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                synced_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records another failed attempt.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts entries not yet synced (including exhausted ones).
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox WHERE synced_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes synced entries older than `days_old` days.
    ///
    /// ## Returns
    /// Number of deleted entries.
    pub async fn cleanup_old_entries(&self, days_old: u32) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM sync_outbox
            WHERE synced_at IS NOT NULL
            AND synced_at < datetime('now', '-' || ?1 || ' days')
            "#,
        )
        .bind(days_old)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use lotto_core::DEFAULT_OWNER_ID;

    #[tokio::test]
    async fn test_queue_and_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        repo.queue(DEFAULT_OWNER_ID, "BOX", "1", r#"{"boxNumber":1}"#)
            .await
            .unwrap();
        repo.queue(DEFAULT_OWNER_ID, "GAME", "746", r#"{"gameNumber":"746"}"#)
            .await
            .unwrap();

        let pending = repo.pending(10, 10).await.unwrap();
        assert_eq!(pending.len(), 2);
        // Oldest first.
        assert_eq!(pending[0].entity_type, "BOX");
        assert_eq!(repo.count_pending().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_synced_removes_from_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        let entry = repo
            .queue(DEFAULT_OWNER_ID, "BOX", "1", "{}")
            .await
            .unwrap();
        repo.mark_synced(&entry.id).await.unwrap();

        assert!(repo.pending(10, 10).await.unwrap().is_empty());
        assert_eq!(repo.count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_attempts_accumulate_until_exhausted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        let entry = repo
            .queue(DEFAULT_OWNER_ID, "COUNTER", "1", "{}")
            .await
            .unwrap();

        repo.mark_failed(&entry.id, "Couldn't save your data. Please try again.")
            .await
            .unwrap();
        repo.mark_failed(&entry.id, "Couldn't save your data. Please try again.")
            .await
            .unwrap();

        let pending = repo.pending(10, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 2);
        assert!(pending[0].last_error.is_some());

        // With the ceiling at 2, the entry is exhausted and parked.
        assert!(repo.pending(10, 2).await.unwrap().is_empty());
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }
}
