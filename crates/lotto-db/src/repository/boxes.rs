//! # Ticket Box Repository
//!
//! Persistence for ticket boxes.
//!
//! ## Write Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The engine owns box state in memory; this repository mirrors it.      │
//! │                                                                         │
//! │  Every write is an UPSERT keyed by (owner_id, state_code, box_number): │
//! │  the same flush path covers "box created", "book assigned" and "scan   │
//! │  applied" without the caller distinguishing insert from update.        │
//! │                                                                         │
//! │  Daily counters are NOT stored here - see CounterRepository. A box     │
//! │  row only carries book identity and scan position.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotto_core::types::{StateCode, TicketBox};

/// Raw row shape for `ticket_boxes`.
///
/// SQLite integers come back as i64; conversion to the domain type happens
/// in one place below.
#[derive(Debug, sqlx::FromRow)]
struct BoxRow {
    box_number: i64,
    ticket_price_cents: i64,
    total_tickets_per_book: i64,
    starting_ticket_number: i64,
    last_scanned_ticket_number: Option<i64>,
    is_configured: bool,
    game_number: Option<String>,
    book_number: Option<String>,
}

impl From<BoxRow> for TicketBox {
    fn from(row: BoxRow) -> Self {
        TicketBox {
            box_number: row.box_number as u32,
            ticket_price_cents: row.ticket_price_cents,
            total_tickets_per_book: row.total_tickets_per_book,
            starting_ticket_number: row.starting_ticket_number,
            last_scanned_ticket_number: row.last_scanned_ticket_number,
            // Counters start at zero; same-day restore overlays them from
            // the daily_counters table.
            tickets_sold: 0,
            total_amount_sold_cents: 0,
            is_configured: row.is_configured,
            game_number: row.game_number,
            book_number: row.book_number,
        }
    }
}

/// Repository for ticket box operations.
#[derive(Debug, Clone)]
pub struct BoxRepository {
    pool: SqlitePool,
}

impl BoxRepository {
    /// Creates a new BoxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BoxRepository { pool }
    }

    /// Lists all boxes for an owner and jurisdiction, ordered by box number.
    ///
    /// Counters on the returned boxes are zero; overlay them from
    /// [`crate::repository::counters::CounterRepository`] for a same-day
    /// restore.
    pub async fn list(&self, owner_id: &str, state: StateCode) -> DbResult<Vec<TicketBox>> {
        let rows = sqlx::query_as::<_, BoxRow>(
            r#"
            SELECT
                box_number,
                ticket_price_cents,
                total_tickets_per_book,
                starting_ticket_number,
                last_scanned_ticket_number,
                is_configured,
                game_number,
                book_number
            FROM ticket_boxes
            WHERE owner_id = ?1 AND state_code = ?2
            ORDER BY box_number
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TicketBox::from).collect())
    }

    /// Inserts or updates a box.
    pub async fn upsert(&self, owner_id: &str, state: StateCode, tb: &TicketBox) -> DbResult<()> {
        debug!(box_number = tb.box_number, "Upserting ticket box");

        let now: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO ticket_boxes (
                owner_id, state_code, box_number,
                ticket_price_cents, total_tickets_per_book,
                starting_ticket_number, last_scanned_ticket_number,
                is_configured, game_number, book_number,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            ON CONFLICT (owner_id, state_code, box_number) DO UPDATE SET
                ticket_price_cents = excluded.ticket_price_cents,
                total_tickets_per_book = excluded.total_tickets_per_book,
                starting_ticket_number = excluded.starting_ticket_number,
                last_scanned_ticket_number = excluded.last_scanned_ticket_number,
                is_configured = excluded.is_configured,
                game_number = excluded.game_number,
                book_number = excluded.book_number,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .bind(tb.box_number as i64)
        .bind(tb.ticket_price_cents)
        .bind(tb.total_tickets_per_book)
        .bind(tb.starting_ticket_number)
        .bind(tb.last_scanned_ticket_number)
        .bind(tb.is_configured)
        .bind(&tb.game_number)
        .bind(&tb.book_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a box.
    ///
    /// Current-day counters for the box should be deleted alongside; the
    /// sync layer does both in one flush.
    pub async fn delete(&self, owner_id: &str, state: StateCode, box_number: u32) -> DbResult<()> {
        debug!(box_number, "Deleting ticket box");

        let result = sqlx::query(
            "DELETE FROM ticket_boxes WHERE owner_id = ?1 AND state_code = ?2 AND box_number = ?3",
        )
        .bind(owner_id)
        .bind(state)
        .bind(box_number as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TicketBox", box_number.to_string()));
        }

        Ok(())
    }

    /// Counts boxes for an owner and jurisdiction.
    pub async fn count(&self, owner_id: &str, state: StateCode) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ticket_boxes WHERE owner_id = ?1 AND state_code = ?2",
        )
        .bind(owner_id)
        .bind(state)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
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

    fn sample_box(box_number: u32) -> TicketBox {
        TicketBox {
            box_number,
            ticket_price_cents: 500,
            total_tickets_per_book: 60,
            starting_ticket_number: 60,
            last_scanned_ticket_number: Some(55),
            tickets_sold: 5,
            total_amount_sold_cents: 2500,
            is_configured: true,
            game_number: Some("746".to_string()),
            book_number: Some("047551".to_string()),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.boxes();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &sample_box(1))
            .await
            .unwrap();
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &sample_box(3))
            .await
            .unwrap();

        let boxes = repo.list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].box_number, 1);
        assert_eq!(boxes[1].box_number, 3);
        assert_eq!(boxes[0].book_number.as_deref(), Some("047551"));

        // Counters are never persisted on the box row.
        assert_eq!(boxes[0].tickets_sold, 0);
        assert_eq!(boxes[0].total_amount_sold_cents, 0);
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.boxes();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &sample_box(1))
            .await
            .unwrap();

        let mut changed = sample_box(1);
        changed.last_scanned_ticket_number = Some(40);
        changed.book_number = Some("047552".to_string());
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &changed)
            .await
            .unwrap();

        let boxes = repo.list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].last_scanned_ticket_number, Some(40));
        assert_eq!(boxes[0].book_number.as_deref(), Some("047552"));
    }

    #[tokio::test]
    async fn test_jurisdictions_are_isolated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.boxes();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &sample_box(1))
            .await
            .unwrap();

        assert!(repo
            .list(DEFAULT_OWNER_ID, StateCode::Dc)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(repo.count(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.boxes();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &sample_box(1))
            .await
            .unwrap();
        repo.delete(DEFAULT_OWNER_ID, StateCode::Md, 1).await.unwrap();

        assert!(repo
            .list(DEFAULT_OWNER_ID, StateCode::Md)
            .await
            .unwrap()
            .is_empty());

        let err = repo.delete(DEFAULT_OWNER_ID, StateCode::Md, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
