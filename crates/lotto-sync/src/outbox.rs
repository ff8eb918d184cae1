//! # Outbox Processor
//!
//! Periodic replay of failed writes parked in `sync_outbox`.
//!
//! ## Replay Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Outbox Replay Cycle                              │
//! │                                                                         │
//! │  every poll_interval:                                                   │
//! │                                                                         │
//! │  1. SELECT pending entries (synced_at IS NULL, attempts < 10)          │
//! │     oldest first, up to batch_size                                      │
//! │                                                                         │
//! │  2. for each entry: decode payload by entity_type, redo the write      │
//! │        ok      → mark_synced                                            │
//! │        failed  → mark_failed (attempts + 1)                            │
//! │                                                                         │
//! │  3. entries at 10 attempts stay parked for manual inspection           │
//! │                                                                         │
//! │  Replays are upserts or deletes keyed by natural identity, so redoing  │
//! │  a write that actually landed the first time changes nothing.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use lotto_core::types::DailyCounter;
use lotto_db::repository::summaries::BoxSaleInput;
use lotto_db::{Database, DbError};

use crate::error::{SyncError, SyncResult, GENERIC_SAVE_ERROR};
use crate::payload::{
    entity, BoxDeletePayload, BoxPayload, CountersClearPayload, GameDeletePayload, GamePayload,
    SettingsPayload, SummaryPayload,
};

/// Retry ceiling: entries at this many failed attempts are left parked.
pub const MAX_RETRY_ATTEMPTS: i64 = 10;

// =============================================================================
// Replay
// =============================================================================

/// Redoes one write from its JSON payload.
///
/// Shared by the agent (first attempt) and the processor (retries): both
/// paths run exactly the same code, so a payload that worked live will
/// work parked.
///
/// Deletes tolerate `NotFound`. An entry can be parked after its write
/// partially landed, and a later manual fix may also have removed the row.
pub(crate) async fn replay(
    db: &Database,
    owner_id: &str,
    entity_type: &str,
    payload: &str,
) -> SyncResult<()> {
    match entity_type {
        entity::BOX => {
            let p: BoxPayload = serde_json::from_str(payload)?;
            db.boxes().upsert(owner_id, p.state, &p.ticket_box).await?;
            db.counters()
                .upsert(
                    owner_id,
                    p.state,
                    p.business_date,
                    &DailyCounter {
                        box_number: p.ticket_box.box_number,
                        tickets_sold: p.ticket_box.tickets_sold,
                        total_amount_sold_cents: p.ticket_box.total_amount_sold_cents,
                    },
                )
                .await?;
        }

        entity::BOX_DELETE => {
            let p: BoxDeletePayload = serde_json::from_str(payload)?;
            match db.boxes().delete(owner_id, p.state, p.box_number).await {
                Ok(()) | Err(DbError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
            db.counters()
                .delete_for_box(owner_id, p.state, p.business_date, p.box_number)
                .await?;
        }

        entity::GAME => {
            let p: GamePayload = serde_json::from_str(payload)?;
            db.games().upsert(owner_id, p.state, &p.game).await?;
        }

        entity::GAME_DELETE => {
            let p: GameDeletePayload = serde_json::from_str(payload)?;
            match db.games().delete(owner_id, p.state, &p.game_number).await {
                Ok(()) | Err(DbError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        entity::SETTINGS => {
            let p: SettingsPayload = serde_json::from_str(payload)?;
            db.settings().upsert(owner_id, p.settings).await?;
        }

        entity::SUMMARY => {
            let p: SummaryPayload = serde_json::from_str(payload)?;
            let inputs: Vec<BoxSaleInput> = p
                .box_sales
                .iter()
                .map(|b| BoxSaleInput {
                    box_number: b.box_number,
                    ticket_price_cents: b.ticket_price_cents,
                    last_scanned_ticket_number: b.last_scanned_ticket_number,
                    tickets_sold: b.tickets_sold,
                    total_amount_sold_cents: b.total_amount_sold_cents,
                })
                .collect();

            db.summaries()
                .archive_day(
                    owner_id,
                    p.business_date,
                    &p.day_of_week,
                    p.total_tickets_sold,
                    p.total_amount_sold_cents,
                    &inputs,
                )
                .await?;

            if p.clear_counters {
                db.counters()
                    .clear_date(owner_id, p.state, p.business_date)
                    .await?;
            }
        }

        entity::COUNTERS_CLEAR => {
            let p: CountersClearPayload = serde_json::from_str(payload)?;
            db.counters()
                .clear_date(owner_id, p.state, p.business_date)
                .await?;
        }

        other => return Err(SyncError::UnknownEntityType(other.to_string())),
    }

    Ok(())
}

// =============================================================================
// Processor
// =============================================================================

/// Processor configuration.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// How often to poll for pending entries.
    pub poll_interval: Duration,

    /// Maximum entries replayed per cycle.
    pub batch_size: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        OutboxConfig {
            poll_interval: Duration::from_secs(30),
            batch_size: 25,
        }
    }
}

/// Periodically replays parked writes.
pub struct OutboxProcessor {
    db: Database,
    config: OutboxConfig,
}

/// Handle for stopping a running [`OutboxProcessor`].
#[derive(Clone)]
pub struct OutboxProcessorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl OutboxProcessorHandle {
    /// Signals the processor to stop after its current cycle.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl OutboxProcessor {
    /// Creates a processor. Call [`OutboxProcessor::spawn`] to run it, or
    /// drive cycles directly with [`OutboxProcessor::process_pending`].
    pub fn new(db: Database, config: OutboxConfig) -> Self {
        OutboxProcessor { db, config }
    }

    /// Spawns the periodic replay loop.
    pub fn spawn(self) -> (OutboxProcessorHandle, JoinHandle<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(shutdown_rx));
        (OutboxProcessorHandle { shutdown_tx }, task)
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            poll_secs = self.config.poll_interval.as_secs(),
            "Outbox processor started"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        // The first tick fires immediately; that's wanted, it drains entries
        // left over from a previous run at startup.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.process_pending().await {
                        warn!(error = %e, "Outbox cycle failed");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        info!("Outbox processor stopped");
    }

    /// Runs one replay cycle and returns how many entries were synced.
    pub async fn process_pending(&self) -> SyncResult<usize> {
        let entries = self
            .db
            .outbox()
            .pending(self.config.batch_size, MAX_RETRY_ATTEMPTS)
            .await?;

        if entries.is_empty() {
            return Ok(0);
        }

        debug!(count = entries.len(), "Replaying outbox entries");
        let mut synced = 0;

        for entry in entries {
            match replay(&self.db, &entry.owner_id, &entry.entity_type, &entry.payload).await {
                Ok(()) => {
                    self.db.outbox().mark_synced(&entry.id).await?;
                    synced += 1;
                }
                Err(e) => {
                    // The stored error stays generic; the raw cause goes to
                    // the debug log only.
                    debug!(
                        entity_type = %entry.entity_type,
                        entity_id = %entry.entity_id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "Outbox replay failed"
                    );
                    self.db
                        .outbox()
                        .mark_failed(&entry.id, GENERIC_SAVE_ERROR)
                        .await?;

                    if !e.is_retryable() {
                        warn!(
                            entity_type = %entry.entity_type,
                            entity_id = %entry.entity_id,
                            "Outbox entry cannot be replayed"
                        );
                    }
                }
            }
        }

        Ok(synced)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ArchivedBoxSale;
    use chrono::NaiveDate;
    use lotto_core::types::{StateCode, TicketBox};
    use lotto_core::DEFAULT_OWNER_ID;
    use lotto_db::DbConfig;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn processor(db: &Database) -> OutboxProcessor {
        OutboxProcessor::new(db.clone(), OutboxConfig::default())
    }

    #[tokio::test]
    async fn test_replay_parked_box_entry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = date("2026-08-30");

        let mut tb = TicketBox::unconfigured(9);
        tb.is_configured = true;
        tb.ticket_price_cents = 1000;
        tb.total_tickets_per_book = 30;
        tb.starting_ticket_number = 30;
        tb.tickets_sold = 2;
        tb.total_amount_sold_cents = 2000;

        let payload = serde_json::to_string(&BoxPayload {
            state: StateCode::Md,
            business_date: today,
            ticket_box: tb,
        })
        .unwrap();
        db.outbox()
            .queue(DEFAULT_OWNER_ID, entity::BOX, "9", &payload)
            .await
            .unwrap();

        let synced = processor(&db).process_pending().await.unwrap();
        assert_eq!(synced, 1);

        let boxes = db.boxes().list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(boxes.len(), 1);
        let counters = db
            .counters()
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert_eq!(counters[0].tickets_sold, 2);
        assert_eq!(db.outbox().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_summary_entry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = date("2026-08-30");

        let payload = serde_json::to_string(&SummaryPayload {
            state: StateCode::Md,
            business_date: today,
            day_of_week: "Sunday".into(),
            total_tickets_sold: 12,
            total_amount_sold_cents: 6000,
            box_sales: vec![ArchivedBoxSale {
                box_number: 1,
                ticket_price_cents: 500,
                last_scanned_ticket_number: Some(48),
                tickets_sold: 12,
                total_amount_sold_cents: 6000,
            }],
            clear_counters: false,
        })
        .unwrap();
        db.outbox()
            .queue(DEFAULT_OWNER_ID, entity::SUMMARY, "2026-08-30", &payload)
            .await
            .unwrap();

        assert_eq!(processor(&db).process_pending().await.unwrap(), 1);

        let summary = db
            .summaries()
            .get_by_date(DEFAULT_OWNER_ID, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_amount_sold_cents, 6000);
        let sales = db.summaries().box_sales(&summary.id).await.unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[tokio::test]
    async fn test_box_delete_tolerates_missing_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let payload = serde_json::to_string(&BoxDeletePayload {
            state: StateCode::Md,
            business_date: date("2026-08-30"),
            box_number: 44,
        })
        .unwrap();
        db.outbox()
            .queue(DEFAULT_OWNER_ID, entity::BOX_DELETE, "44", &payload)
            .await
            .unwrap();

        // No box 44 exists; the replay must still succeed.
        assert_eq!(processor(&db).process_pending().await.unwrap(), 1);
        assert_eq!(db.outbox().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_payload_marks_failed_with_generic_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.outbox()
            .queue(DEFAULT_OWNER_ID, entity::GAME, "746", "not json at all")
            .await
            .unwrap();

        assert_eq!(processor(&db).process_pending().await.unwrap(), 0);

        let pending = db.outbox().pending(10, MAX_RETRY_ATTEMPTS).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some(GENERIC_SAVE_ERROR));
    }

    #[tokio::test]
    async fn test_unknown_entity_type_marks_failed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.outbox()
            .queue(DEFAULT_OWNER_ID, "WIDGET", "1", "{}")
            .await
            .unwrap();

        assert_eq!(processor(&db).process_pending().await.unwrap(), 0);
        let pending = db.outbox().pending(10, MAX_RETRY_ATTEMPTS).await.unwrap();
        assert_eq!(pending[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_exhausted_entries_are_skipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let entry = db
            .outbox()
            .queue(DEFAULT_OWNER_ID, entity::GAME, "746", "broken")
            .await
            .unwrap();
        for _ in 0..MAX_RETRY_ATTEMPTS {
            db.outbox()
                .mark_failed(&entry.id, GENERIC_SAVE_ERROR)
                .await
                .unwrap();
        }

        // At the ceiling the cycle leaves it parked and touches nothing.
        assert_eq!(processor(&db).process_pending().await.unwrap(), 0);
        assert_eq!(db.outbox().count_pending().await.unwrap(), 1);
    }
}
