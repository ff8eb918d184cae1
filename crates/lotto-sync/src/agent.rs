//! # Sync Agent
//!
//! The single background worker that flushes session state to SQLite.
//!
//! ## Worker Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncAgent Worker Model                           │
//! │                                                                         │
//! │  App thread (scan path, synchronous)                                    │
//! │       │                                                                 │
//! │       │  handle.flush_box(...)        fire-and-forget, never awaits    │
//! │       │  handle.archive_day(...)      the database                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────┐                                        │
//! │  │  unbounded mpsc (FIFO)      │   one queue per agent                  │
//! │  └──────────────┬──────────────┘                                        │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  ┌─────────────────────────────┐                                        │
//! │  │  worker task (exactly one)  │   applies writes in enqueue order     │
//! │  │                             │                                        │
//! │  │  write ok ──────────→ done  │                                        │
//! │  │  write failed ──→ park JSON │   sync_outbox, retried by the         │
//! │  │                  in outbox  │   OutboxProcessor                     │
//! │  └─────────────────────────────┘                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single worker per store is deliberate: writes for one owner must apply
//! in the order the operator performed them. Two box flushes for the same
//! box racing each other would let an older state win.

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lotto_core::types::{GameInfo, StateCode, StoreSettings, TicketBox};
use lotto_core::DEFAULT_OWNER_ID;
use lotto_db::Database;

use crate::error::{SyncError, SyncResult, GENERIC_SAVE_ERROR};
use crate::outbox::replay;
use crate::payload::{
    entity, ArchivedBoxSale, BoxDeletePayload, BoxPayload, CountersClearPayload,
    GameDeletePayload, GamePayload, SettingsPayload, SummaryPayload,
};

// =============================================================================
// Configuration
// =============================================================================

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Owner scope for every write this agent performs.
    pub owner_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            owner_id: DEFAULT_OWNER_ID.to_string(),
        }
    }
}

// =============================================================================
// Tasks
// =============================================================================

/// One unit of work on the queue.
///
/// Payloads are encoded at enqueue time, so a task captures the entity state
/// as of the moment the operator acted, not as of when the worker gets to it.
enum SyncTask {
    Write {
        entity_type: &'static str,
        entity_id: String,
        payload: String,
    },
    Shutdown,
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable enqueue handle for a running [`SyncAgent`].
///
/// Every method is fire-and-forget: it encodes a payload, pushes it on the
/// queue, and returns without touching the database. The only failure a
/// caller can see here is an agent that has already shut down.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncTask>,
}

impl SyncHandle {
    fn enqueue(
        &self,
        entity_type: &'static str,
        entity_id: String,
        payload: impl serde::Serialize,
    ) -> SyncResult<()> {
        let payload = serde_json::to_string(&payload)?;
        self.tx
            .send(SyncTask::Write {
                entity_type,
                entity_id,
                payload,
            })
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Flushes one box's full state and its current-day counters.
    pub fn flush_box(
        &self,
        state: StateCode,
        business_date: NaiveDate,
        ticket_box: &TicketBox,
    ) -> SyncResult<()> {
        self.enqueue(
            entity::BOX,
            ticket_box.box_number.to_string(),
            BoxPayload {
                state,
                business_date,
                ticket_box: ticket_box.clone(),
            },
        )
    }

    /// Removes a box row and its current-day counters.
    pub fn remove_box(
        &self,
        state: StateCode,
        business_date: NaiveDate,
        box_number: u32,
    ) -> SyncResult<()> {
        self.enqueue(
            entity::BOX_DELETE,
            box_number.to_string(),
            BoxDeletePayload {
                state,
                business_date,
                box_number,
            },
        )
    }

    /// Flushes one game catalog entry.
    pub fn flush_game(&self, state: StateCode, game: &GameInfo) -> SyncResult<()> {
        self.enqueue(
            entity::GAME,
            game.game_number.clone(),
            GamePayload {
                state,
                game: game.clone(),
            },
        )
    }

    /// Removes a game catalog entry.
    pub fn remove_game(&self, state: StateCode, game_number: &str) -> SyncResult<()> {
        self.enqueue(
            entity::GAME_DELETE,
            game_number.to_string(),
            GameDeletePayload {
                state,
                game_number: game_number.to_string(),
            },
        )
    }

    /// Flushes store settings.
    pub fn flush_settings(&self, settings: StoreSettings) -> SyncResult<()> {
        self.enqueue(
            entity::SETTINGS,
            settings.state_code.to_string(),
            SettingsPayload { settings },
        )
    }

    /// Archives one business day (replace-or-insert by date).
    ///
    /// Set `clear_counters` when the archive accompanies a daily reset, so
    /// the day's restore counters are dropped in the same replayable unit.
    ///
    /// A day with no box sales at all is not archived; resetting an untouched
    /// store must not create empty history rows.
    #[allow(clippy::too_many_arguments)]
    pub fn archive_day(
        &self,
        state: StateCode,
        business_date: NaiveDate,
        total_tickets_sold: i64,
        total_amount_sold_cents: i64,
        box_sales: Vec<ArchivedBoxSale>,
        clear_counters: bool,
    ) -> SyncResult<()> {
        if box_sales.iter().all(|b| b.tickets_sold == 0) {
            debug!(%business_date, "No sales to archive, skipping");
            if clear_counters {
                return self.clear_counters(state, business_date);
            }
            return Ok(());
        }

        self.enqueue(
            entity::SUMMARY,
            business_date.to_string(),
            SummaryPayload {
                state,
                business_date,
                day_of_week: business_date.format("%A").to_string(),
                total_tickets_sold,
                total_amount_sold_cents,
                box_sales,
                clear_counters,
            },
        )
    }

    /// Drops one business date's restore counters without archiving.
    ///
    /// Used by the discard-position reset, which throws the day away.
    pub fn clear_counters(&self, state: StateCode, business_date: NaiveDate) -> SyncResult<()> {
        self.enqueue(
            entity::COUNTERS_CLEAR,
            business_date.to_string(),
            CountersClearPayload {
                state,
                business_date,
            },
        )
    }

    /// Asks the worker to stop after draining everything enqueued before
    /// this call. Await the agent's join handle to know it finished.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SyncTask::Shutdown);
    }
}

// =============================================================================
// Agent
// =============================================================================

/// Spawns the background persistence worker.
pub struct SyncAgent;

impl SyncAgent {
    /// Spawns the worker task and returns its enqueue handle.
    ///
    /// The join handle resolves after [`SyncHandle::shutdown`] once the
    /// queue is drained, or once every handle clone has been dropped.
    pub fn spawn(db: Database, config: SyncConfig) -> (SyncHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();

        info!(owner_id = %config.owner_id, "Starting sync agent");
        let worker = tokio::spawn(Self::worker(db, config, rx));

        (SyncHandle { tx }, worker)
    }

    async fn worker(
        db: Database,
        config: SyncConfig,
        mut rx: mpsc::UnboundedReceiver<SyncTask>,
    ) {
        while let Some(task) = rx.recv().await {
            match task {
                SyncTask::Write {
                    entity_type,
                    entity_id,
                    payload,
                } => {
                    Self::apply(&db, &config.owner_id, entity_type, &entity_id, &payload).await;
                }
                SyncTask::Shutdown => break,
            }
        }

        info!("Sync agent stopped");
    }

    /// Applies one write; on failure parks the payload for later replay.
    ///
    /// The raw database error goes to the debug log only. The warn line an
    /// operator might see carries the generic save message.
    async fn apply(
        db: &Database,
        owner_id: &str,
        entity_type: &'static str,
        entity_id: &str,
        payload: &str,
    ) {
        match replay(db, owner_id, entity_type, payload).await {
            Ok(()) => {
                debug!(entity_type, entity_id, "Flushed");
            }
            Err(e) if e.is_retryable() => {
                warn!(entity_type, entity_id, "{}", GENERIC_SAVE_ERROR);
                debug!(entity_type, entity_id, error = %e, "Flush failed, parking in outbox");

                if let Err(park_err) = db
                    .outbox()
                    .queue(owner_id, entity_type, entity_id, payload)
                    .await
                {
                    // Both the write and the park failed. Nothing left to do
                    // but log loudly; the in-memory session still has the data.
                    error!(entity_type, entity_id, error = %park_err, "Failed to park entry in outbox");
                }
            }
            Err(e) => {
                // Deterministic failure (bad payload, unknown type). Parking
                // it would burn retry attempts on something that cannot heal.
                error!(entity_type, entity_id, error = %e, "Unreplayable flush dropped");
            }
        }
    }
}

/// Today's business date in the store's local timezone.
pub fn business_date_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::DbConfig;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn configured_box(box_number: u32, sold: i64) -> TicketBox {
        TicketBox {
            box_number,
            ticket_price_cents: 500,
            total_tickets_per_book: 60,
            starting_ticket_number: 60,
            last_scanned_ticket_number: Some(60 - sold),
            tickets_sold: sold,
            total_amount_sold_cents: sold * 500,
            is_configured: true,
            game_number: Some("746".into()),
            book_number: Some("047551".into()),
        }
    }

    async fn spawn_agent() -> (Database, SyncHandle, JoinHandle<()>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (handle, worker) = SyncAgent::spawn(db.clone(), SyncConfig::default());
        (db, handle, worker)
    }

    #[tokio::test]
    async fn test_flush_box_writes_row_and_counters() {
        let (db, handle, worker) = spawn_agent().await;
        let today = date("2026-08-30");

        handle
            .flush_box(StateCode::Md, today, &configured_box(3, 5))
            .unwrap();
        handle.shutdown();
        worker.await.unwrap();

        let boxes = db.boxes().list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].box_number, 3);
        // Counters live in their own table, keyed by business date.
        let counters = db
            .counters()
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].tickets_sold, 5);
        assert_eq!(counters[0].total_amount_sold_cents, 2500);

        assert_eq!(db.outbox().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_writes_apply_in_enqueue_order() {
        let (db, handle, worker) = spawn_agent().await;
        let today = date("2026-08-30");

        handle
            .flush_box(StateCode::Md, today, &configured_box(1, 2))
            .unwrap();
        handle
            .flush_box(StateCode::Md, today, &configured_box(1, 7))
            .unwrap();
        handle.remove_box(StateCode::Md, today, 1).unwrap();
        handle.shutdown();
        worker.await.unwrap();

        // The delete was enqueued last, so the box must be gone.
        let boxes = db.boxes().list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert!(boxes.is_empty());
        let counters = db
            .counters()
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert!(counters.is_empty());
    }

    #[tokio::test]
    async fn test_flush_game_and_settings() {
        let (db, handle, worker) = spawn_agent().await;

        let game = GameInfo {
            game_number: "746".into(),
            ticket_price_cents: 500,
            total_tickets_per_book: 60,
        };
        handle.flush_game(StateCode::Dc, &game).unwrap();
        handle
            .flush_settings(StoreSettings {
                state_code: StateCode::Dc,
                ticket_order: crate::TicketOrder::Ascending,
            })
            .unwrap();
        handle.shutdown();
        worker.await.unwrap();

        let games = db.games().list(DEFAULT_OWNER_ID, StateCode::Dc).await.unwrap();
        assert_eq!(games, vec![game]);

        let settings = db.settings().get(DEFAULT_OWNER_ID).await.unwrap().unwrap();
        assert_eq!(settings.state_code, StateCode::Dc);
    }

    #[tokio::test]
    async fn test_archive_day_with_counter_clear() {
        let (db, handle, worker) = spawn_agent().await;
        let today = date("2026-08-30");

        // Counters present from an earlier flush.
        handle
            .flush_box(StateCode::Md, today, &configured_box(1, 4))
            .unwrap();
        handle
            .archive_day(
                StateCode::Md,
                today,
                4,
                2000,
                vec![ArchivedBoxSale {
                    box_number: 1,
                    ticket_price_cents: 500,
                    last_scanned_ticket_number: Some(56),
                    tickets_sold: 4,
                    total_amount_sold_cents: 2000,
                }],
                true,
            )
            .unwrap();
        handle.shutdown();
        worker.await.unwrap();

        let summary = db
            .summaries()
            .get_by_date(DEFAULT_OWNER_ID, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_tickets_sold, 4);
        assert_eq!(summary.day_of_week, "Sunday");
        assert_eq!(summary.active_boxes, 1);

        // clear_counters dropped the restore rows with the archive.
        let counters = db
            .counters()
            .for_date(DEFAULT_OWNER_ID, StateCode::Md, today)
            .await
            .unwrap();
        assert!(counters.is_empty());
    }

    #[tokio::test]
    async fn test_archive_day_without_sales_is_skipped() {
        let (db, handle, worker) = spawn_agent().await;
        let today = date("2026-08-30");

        handle
            .archive_day(
                StateCode::Md,
                today,
                0,
                0,
                vec![ArchivedBoxSale {
                    box_number: 1,
                    ticket_price_cents: 500,
                    last_scanned_ticket_number: None,
                    tickets_sold: 0,
                    total_amount_sold_cents: 0,
                }],
                false,
            )
            .unwrap();
        handle.shutdown();
        worker.await.unwrap();

        assert!(db
            .summaries()
            .get_by_date(DEFAULT_OWNER_ID, today)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_handle_rejects_after_shutdown() {
        let (_db, handle, worker) = spawn_agent().await;

        handle.shutdown();
        worker.await.unwrap();

        let err = handle
            .flush_box(StateCode::Md, date("2026-08-30"), &configured_box(1, 0))
            .unwrap_err();
        assert!(matches!(err, SyncError::ChannelClosed));
    }
}
