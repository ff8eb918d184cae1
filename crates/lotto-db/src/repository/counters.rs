//! # Daily Counter Repository
//!
//! Per-box sales counters keyed by business date.
//!
//! ## Same-Day Restore
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  App restarts at 2pm, mid-business-day:                                 │
//! │                                                                         │
//! │  1. BoxRepository.list()        → boxes with zeroed counters           │
//! │  2. CounterRepository.for_date(today)                                   │
//! │  3. TicketSession::restore_counters(...)                                │
//! │                                                                         │
//! │  Yesterday's counters stay under yesterday's date and are never        │
//! │  overlaid; a fresh date simply has no rows yet.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use lotto_core::types::{DailyCounter, StateCode};

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    box_number: i64,
    tickets_sold: i64,
    total_amount_sold_cents: i64,
}

impl From<CounterRow> for DailyCounter {
    fn from(row: CounterRow) -> Self {
        DailyCounter {
            box_number: row.box_number as u32,
            tickets_sold: row.tickets_sold,
            total_amount_sold_cents: row.total_amount_sold_cents,
        }
    }
}

/// Repository for daily counter operations.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    /// Creates a new CounterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Counters recorded for one business date, ordered by box number.
    pub async fn for_date(
        &self,
        owner_id: &str,
        state: StateCode,
        date: NaiveDate,
    ) -> DbResult<Vec<DailyCounter>> {
        let rows = sqlx::query_as::<_, CounterRow>(
            r#"
            SELECT box_number, tickets_sold, total_amount_sold_cents
            FROM daily_counters
            WHERE owner_id = ?1 AND state_code = ?2 AND business_date = ?3
            ORDER BY box_number
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DailyCounter::from).collect())
    }

    /// Inserts or updates one box's counters for a business date.
    pub async fn upsert(
        &self,
        owner_id: &str,
        state: StateCode,
        date: NaiveDate,
        counter: &DailyCounter,
    ) -> DbResult<()> {
        debug!(
            box_number = counter.box_number,
            %date,
            "Upserting daily counter"
        );

        let now: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO daily_counters (
                owner_id, state_code, business_date, box_number,
                tickets_sold, total_amount_sold_cents, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (owner_id, state_code, business_date, box_number) DO UPDATE SET
                tickets_sold = excluded.tickets_sold,
                total_amount_sold_cents = excluded.total_amount_sold_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .bind(date)
        .bind(counter.box_number as i64)
        .bind(counter.tickets_sold)
        .bind(counter.total_amount_sold_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes one box's counters for a business date.
    ///
    /// Used when the box itself is removed mid-day; absent rows are fine.
    pub async fn delete_for_box(
        &self,
        owner_id: &str,
        state: StateCode,
        date: NaiveDate,
        box_number: u32,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            DELETE FROM daily_counters
            WHERE owner_id = ?1 AND state_code = ?2 AND business_date = ?3 AND box_number = ?4
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .bind(date)
        .bind(box_number as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes all counters for a business date.
    ///
    /// Called after a daily reset: the day's live counters are gone from the
    /// session, so the restore rows must go too.
    pub async fn clear_date(
        &self,
        owner_id: &str,
        state: StateCode,
        date: NaiveDate,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM daily_counters WHERE owner_id = ?1 AND state_code = ?2 AND business_date = ?3",
        )
        .bind(owner_id)
        .bind(state)
        .bind(date)
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

    fn counter(box_number: u32, sold: i64) -> DailyCounter {
        DailyCounter {
            box_number,
            tickets_sold: sold,
            total_amount_sold_cents: sold * 500,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_restore_for_date() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.counters();
        let today = date("2026-08-30");

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, today, &counter(1, 5))
            .await
            .unwrap();
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, today, &counter(2, 3))
            .await
            .unwrap();
        // Second scan of box 1 the same day overwrites, not accumulates.
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, today, &counter(1, 8))
            .await
            .unwrap();

        let counters = repo
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].box_number, 1);
        assert_eq!(counters[0].tickets_sold, 8);
        assert_eq!(counters[1].tickets_sold, 3);
    }

    #[tokio::test]
    async fn test_dates_are_isolated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.counters();

        repo.upsert(
            DEFAULT_OWNER_ID,
            StateCode::Md,
            date("2026-08-29"),
            &counter(1, 5),
        )
        .await
        .unwrap();

        let today = repo
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, date("2026-08-30"))
            .await
            .unwrap();
        assert!(today.is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.counters();
        let today = date("2026-08-30");

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, today, &counter(1, 5))
            .await
            .unwrap();
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, today, &counter(2, 3))
            .await
            .unwrap();

        repo.delete_for_box(DEFAULT_OWNER_ID, StateCode::Md, today, 1)
            .await
            .unwrap();
        let left = repo
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].box_number, 2);

        let cleared = repo
            .clear_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert_eq!(cleared, 1);
    }
}
