//! # Daily Summary Repository
//!
//! The archived-day history: one summary row per (owner, business date) with
//! a per-box breakdown underneath.
//!
//! ## Replace-Or-Insert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Archiving the SAME date twice (reset, scan more, reset again) must    │
//! │  leave one summary for that date, not two:                             │
//! │                                                                         │
//! │  archive_day(date)                                                     │
//! │       │                                                                 │
//! │       ├── summary for date exists?                                     │
//! │       │       YES: update totals in place, delete its old box rows     │
//! │       │       NO:  insert a fresh summary row                          │
//! │       │                                                                 │
//! │       └── insert the new per-box rows                                  │
//! │                                                                         │
//! │  All inside one transaction: a crash can't leave totals without        │
//! │  their breakdown.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lotto_core::types::{DailyBoxSale, DailySummary};

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: String,
    summary_date: NaiveDate,
    day_of_week: String,
    total_tickets_sold: i64,
    total_amount_sold_cents: i64,
    active_boxes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SummaryRow> for DailySummary {
    fn from(row: SummaryRow) -> Self {
        DailySummary {
            id: row.id,
            summary_date: row.summary_date,
            day_of_week: row.day_of_week,
            total_tickets_sold: row.total_tickets_sold,
            total_amount_sold_cents: row.total_amount_sold_cents,
            active_boxes: row.active_boxes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BoxSaleRow {
    id: String,
    summary_id: String,
    box_number: i64,
    ticket_price_cents: i64,
    last_scanned_ticket_number: Option<i64>,
    tickets_sold: i64,
    total_amount_sold_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoxSaleRow> for DailyBoxSale {
    fn from(row: BoxSaleRow) -> Self {
        DailyBoxSale {
            id: row.id,
            summary_id: row.summary_id,
            box_number: row.box_number as u32,
            ticket_price_cents: row.ticket_price_cents,
            last_scanned_ticket_number: row.last_scanned_ticket_number,
            tickets_sold: row.tickets_sold,
            total_amount_sold_cents: row.total_amount_sold_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Per-box figures handed to [`SummaryRepository::archive_day`].
///
/// Ids and the summary linkage are assigned inside the transaction, so the
/// caller only supplies the business data.
#[derive(Debug, Clone)]
pub struct BoxSaleInput {
    pub box_number: u32,
    pub ticket_price_cents: i64,
    pub last_scanned_ticket_number: Option<i64>,
    pub tickets_sold: i64,
    pub total_amount_sold_cents: i64,
}

/// Repository for archived-day operations.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    pool: SqlitePool,
}

impl SummaryRepository {
    /// Creates a new SummaryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SummaryRepository { pool }
    }

    /// Archives one business day, replacing any previous archive of the
    /// same date.
    ///
    /// ## Returns
    /// The summary id (existing id when replacing, fresh UUID otherwise).
    pub async fn archive_day(
        &self,
        owner_id: &str,
        date: NaiveDate,
        day_of_week: &str,
        total_tickets_sold: i64,
        total_amount_sold_cents: i64,
        box_sales: &[BoxSaleInput],
    ) -> DbResult<String> {
        debug!(%date, boxes = box_sales.len(), "Archiving business day");

        let now: DateTime<Utc> = Utc::now();
        let active_boxes = box_sales.iter().filter(|b| b.tickets_sold > 0).count() as i64;

        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM daily_summaries WHERE owner_id = ?1 AND summary_date = ?2",
        )
        .bind(owner_id)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;

        let summary_id = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE daily_summaries SET
                        day_of_week = ?2,
                        total_tickets_sold = ?3,
                        total_amount_sold_cents = ?4,
                        active_boxes = ?5,
                        updated_at = ?6
                    WHERE id = ?1
                    "#,
                )
                .bind(&id)
                .bind(day_of_week)
                .bind(total_tickets_sold)
                .bind(total_amount_sold_cents)
                .bind(active_boxes)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                sqlx::query("DELETE FROM daily_box_sales WHERE summary_id = ?1")
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;

                id
            }
            None => {
                let id = Uuid::new_v4().to_string();

                sqlx::query(
                    r#"
                    INSERT INTO daily_summaries (
                        id, owner_id, summary_date, day_of_week,
                        total_tickets_sold, total_amount_sold_cents, active_boxes,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                    "#,
                )
                .bind(&id)
                .bind(owner_id)
                .bind(date)
                .bind(day_of_week)
                .bind(total_tickets_sold)
                .bind(total_amount_sold_cents)
                .bind(active_boxes)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                id
            }
        };

        for sale in box_sales {
            sqlx::query(
                r#"
                INSERT INTO daily_box_sales (
                    id, summary_id, box_number, ticket_price_cents,
                    last_scanned_ticket_number, tickets_sold,
                    total_amount_sold_cents, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&summary_id)
            .bind(sale.box_number as i64)
            .bind(sale.ticket_price_cents)
            .bind(sale.last_scanned_ticket_number)
            .bind(sale.tickets_sold)
            .bind(sale.total_amount_sold_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(summary_id)
    }

    /// Recent archived days, most recent date first.
    pub async fn list_recent(&self, owner_id: &str, limit: u32) -> DbResult<Vec<DailySummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                id, summary_date, day_of_week,
                total_tickets_sold, total_amount_sold_cents, active_boxes,
                created_at, updated_at
            FROM daily_summaries
            WHERE owner_id = ?1
            ORDER BY summary_date DESC
            LIMIT ?2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DailySummary::from).collect())
    }

    /// One archived day by date.
    pub async fn get_by_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<DailySummary>> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                id, summary_date, day_of_week,
                total_tickets_sold, total_amount_sold_cents, active_boxes,
                created_at, updated_at
            FROM daily_summaries
            WHERE owner_id = ?1 AND summary_date = ?2
            "#,
        )
        .bind(owner_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailySummary::from))
    }

    /// Per-box breakdown for one summary, ordered by box number.
    pub async fn box_sales(&self, summary_id: &str) -> DbResult<Vec<DailyBoxSale>> {
        let rows = sqlx::query_as::<_, BoxSaleRow>(
            r#"
            SELECT
                id, summary_id, box_number, ticket_price_cents,
                last_scanned_ticket_number, tickets_sold,
                total_amount_sold_cents, created_at, updated_at
            FROM daily_box_sales
            WHERE summary_id = ?1
            ORDER BY box_number
            "#,
        )
        .bind(summary_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DailyBoxSale::from).collect())
    }

    /// Corrects one box's figures on an already archived day.
    ///
    /// Used for retroactive fixes (a miskeyed manual entry discovered after
    /// the day was reset). The caller follows up with
    /// [`SummaryRepository::update_summary_totals`] so the parent row agrees
    /// with its breakdown.
    pub async fn update_box_sale(
        &self,
        sale_id: &str,
        tickets_sold: i64,
        total_amount_sold_cents: i64,
    ) -> DbResult<()> {
        debug!(sale_id, tickets_sold, "Updating archived box sale");

        let now: DateTime<Utc> = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE daily_box_sales SET
                tickets_sold = ?2,
                total_amount_sold_cents = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(tickets_sold)
        .bind(total_amount_sold_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DailyBoxSale", sale_id));
        }

        Ok(())
    }

    /// Recomputes an archived day's totals from its box rows.
    pub async fn update_summary_totals(&self, summary_id: &str) -> DbResult<()> {
        let now: DateTime<Utc> = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE daily_summaries SET
                total_tickets_sold = (
                    SELECT COALESCE(SUM(tickets_sold), 0)
                    FROM daily_box_sales WHERE summary_id = ?1
                ),
                total_amount_sold_cents = (
                    SELECT COALESCE(SUM(total_amount_sold_cents), 0)
                    FROM daily_box_sales WHERE summary_id = ?1
                ),
                active_boxes = (
                    SELECT COUNT(*)
                    FROM daily_box_sales WHERE summary_id = ?1 AND tickets_sold > 0
                ),
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(summary_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DailySummary", summary_id));
        }

        Ok(())
    }

    /// Deletes one archived day and its breakdown (ON DELETE CASCADE).
    pub async fn delete_by_date(&self, owner_id: &str, date: NaiveDate) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM daily_summaries WHERE owner_id = ?1 AND summary_date = ?2")
                .bind(owner_id)
                .bind(date)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DailySummary", date.to_string()));
        }

        Ok(())
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

    fn sale(box_number: u32, sold: i64) -> BoxSaleInput {
        BoxSaleInput {
            box_number,
            ticket_price_cents: 500,
            last_scanned_ticket_number: Some(60 - sold),
            tickets_sold: sold,
            total_amount_sold_cents: sold * 500,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_archive_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.summaries();
        let day = date("2026-08-30");

        let summary_id = repo
            .archive_day(
                DEFAULT_OWNER_ID,
                day,
                "Sunday",
                8,
                4000,
                &[sale(1, 5), sale(2, 3), sale(3, 0)],
            )
            .await
            .unwrap();

        let summary = repo
            .get_by_date(DEFAULT_OWNER_ID, day)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.id, summary_id);
        assert_eq!(summary.total_tickets_sold, 8);
        assert_eq!(summary.active_boxes, 2); // box 3 sold nothing

        let breakdown = repo.box_sales(&summary_id).await.unwrap();
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].box_number, 1);
        assert_eq!(breakdown[0].tickets_sold, 5);
    }

    #[tokio::test]
    async fn test_rearchiving_same_date_replaces() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.summaries();
        let day = date("2026-08-30");

        let first_id = repo
            .archive_day(DEFAULT_OWNER_ID, day, "Sunday", 5, 2500, &[sale(1, 5)])
            .await
            .unwrap();

        // Second archive later the same day: more sold, different breakdown.
        let second_id = repo
            .archive_day(
                DEFAULT_OWNER_ID,
                day,
                "Sunday",
                12,
                6000,
                &[sale(1, 7), sale(2, 5)],
            )
            .await
            .unwrap();

        // Same summary row, updated in place.
        assert_eq!(first_id, second_id);

        let all = repo.list_recent(DEFAULT_OWNER_ID, 10).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total_tickets_sold, 12);

        // Old breakdown fully replaced, not appended.
        let breakdown = repo.box_sales(&second_id).await.unwrap();
        assert_eq!(breakdown.len(), 2);
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_date_desc() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.summaries();

        for (d, dow) in [
            ("2026-08-28", "Friday"),
            ("2026-08-30", "Sunday"),
            ("2026-08-29", "Saturday"),
        ] {
            repo.archive_day(DEFAULT_OWNER_ID, date(d), dow, 1, 500, &[sale(1, 1)])
                .await
                .unwrap();
        }

        let recent = repo.list_recent(DEFAULT_OWNER_ID, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].summary_date, date("2026-08-30"));
        assert_eq!(recent[1].summary_date, date("2026-08-29"));
    }

    #[tokio::test]
    async fn test_retroactive_edit_recomputes_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.summaries();
        let day = date("2026-08-29");

        let id = repo
            .archive_day(
                DEFAULT_OWNER_ID,
                day,
                "Saturday",
                8,
                4000,
                &[sale(1, 5), sale(2, 3)],
            )
            .await
            .unwrap();

        // Box 2 was actually a miskeyed entry: nothing sold.
        let breakdown = repo.box_sales(&id).await.unwrap();
        repo.update_box_sale(&breakdown[1].id, 0, 0).await.unwrap();
        repo.update_summary_totals(&id).await.unwrap();

        let summary = repo.get_by_date(DEFAULT_OWNER_ID, day).await.unwrap().unwrap();
        assert_eq!(summary.total_tickets_sold, 5);
        assert_eq!(summary.total_amount_sold_cents, 2500);
        assert_eq!(summary.active_boxes, 1);

        let err = repo.update_box_sale("no-such-id", 1, 500).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_box_sales() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.summaries();
        let day = date("2026-08-30");

        let id = repo
            .archive_day(DEFAULT_OWNER_ID, day, "Sunday", 5, 2500, &[sale(1, 5)])
            .await
            .unwrap();

        repo.delete_by_date(DEFAULT_OWNER_ID, day).await.unwrap();
        assert!(repo.get_by_date(DEFAULT_OWNER_ID, day).await.unwrap().is_none());
        assert!(repo.box_sales(&id).await.unwrap().is_empty());

        let err = repo.delete_by_date(DEFAULT_OWNER_ID, day).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
