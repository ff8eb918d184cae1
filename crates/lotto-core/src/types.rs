//! # Domain Types
//!
//! Core domain types used throughout Lotto POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   TicketBox     │   │    GameInfo     │   │   ScanResult    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  box_number     │   │  game_number    │   │  tickets_sold   │       │
//! │  │  ticket counts  │   │  price_cents    │   │  amount_cents   │       │
//! │  │  current book   │   │  per_book count │   │  book_transition│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StoreSettings  │   │   StateCode     │   │  TicketOrder    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  state_code     │   │  Md (20-digit)  │   │  Descending     │       │
//! │  │  ticket_order   │   │  Dc (dashed)    │   │  Ascending      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Live entities use natural business keys (`box_number`, `game_number`)
//! scoped per owner and jurisdiction; archived rows (`DailySummary`,
//! `DailyBoxSale`) carry UUID v4 ids because they are append-style records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Jurisdiction
// =============================================================================

/// The lottery jurisdiction a store operates in.
///
/// The jurisdiction decides which barcode format the scanner produces; each
/// variant carries its own parse function in [`crate::barcode`]. Adding a
/// jurisdiction means adding a variant there, not scattering `if` branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum StateCode {
    /// Maryland: fixed 20-digit numeric barcodes.
    Md,
    /// Washington DC: dashed (`1619-04147-7-017`) or 12+ digit numeric.
    Dc,
}

impl StateCode {
    /// Human-readable jurisdiction name.
    pub const fn label(&self) -> &'static str {
        match self {
            StateCode::Md => "Maryland",
            StateCode::Dc => "Washington DC",
        }
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateCode::Md => write!(f, "MD"),
            StateCode::Dc => write!(f, "DC"),
        }
    }
}

// =============================================================================
// Ticket Order
// =============================================================================

/// Direction ticket numbers move as a book sells down.
///
/// Most jurisdictions print books that count down (60, 59, 58...); some
/// count up (1, 2, 3...). The sequence check and sold-quantity math in the
/// engine are direction-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TicketOrder {
    /// Ticket numbers decrease with each sale.
    Descending,
    /// Ticket numbers increase with each sale.
    Ascending,
}

impl fmt::Display for TicketOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketOrder::Descending => write!(f, "descending"),
            TicketOrder::Ascending => write!(f, "ascending"),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Global per-owner configuration governing parsing and sequence direction.
///
/// ## Mutability Rule
/// Settings may only change while no box has nonzero `tickets_sold`;
/// changing the counting semantics mid-day would corrupt the counters.
/// The engine enforces this in [`crate::engine::TicketSession::update_settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub state_code: StateCode,
    pub ticket_order: TicketOrder,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            state_code: StateCode::Md,
            ticket_order: TicketOrder::Descending,
        }
    }
}

// =============================================================================
// Game Info
// =============================================================================

/// A known scratch-off game: its ticket price and book capacity.
///
/// Created the first time a book for the game is configured, so that future
/// boxes (and automatic book transitions) can pick up price and capacity
/// without re-entry. Identity key is `game_number`, scoped per owner and
/// jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    /// Game number as printed on the ticket (e.g. "746").
    pub game_number: String,

    /// Price per ticket in cents.
    pub ticket_price_cents: i64,

    /// Printed capacity of one book of this game.
    pub total_tickets_per_book: i64,
}

// =============================================================================
// Ticket Box
// =============================================================================

/// One physical display box holding at most one ticket book at a time.
///
/// ## Field Semantics
/// - `starting_ticket_number`: the reference point before any scan, i.e. the
///   ticket expected at the top of a fresh or resumed book.
/// - `last_scanned_ticket_number`: `None` means "no scan yet this book";
///   this is distinct from zero tickets sold.
/// - `total_amount_sold_cents` is the running sum of per-scan amounts at
///   the price in effect at scan time. It is NOT `tickets_sold × price`,
///   because the price can change across a book transition within a day.
///
/// ## Invariants
/// - `tickets_sold >= 0`, `total_amount_sold_cents >= 0`
/// - configured boxes have `ticket_price_cents > 0` and
///   `total_tickets_per_book > 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketBox {
    /// Box number as labeled on the physical rack (the stable identity).
    pub box_number: u32,

    /// Price per ticket in cents for the currently loaded book.
    pub ticket_price_cents: i64,

    /// Printed capacity of the currently loaded book.
    pub total_tickets_per_book: i64,

    /// Reference ticket number before any scan this book.
    pub starting_ticket_number: i64,

    /// Last scanned ticket number, or None if nothing scanned this book.
    pub last_scanned_ticket_number: Option<i64>,

    /// Tickets sold so far this business day.
    pub tickets_sold: i64,

    /// Amount sold so far this business day, in cents.
    pub total_amount_sold_cents: i64,

    /// False = placeholder box with no book assigned.
    pub is_configured: bool,

    /// Game number of the currently loaded book.
    pub game_number: Option<String>,

    /// Book number of the currently loaded book (normalized for DC).
    pub book_number: Option<String>,
}

impl TicketBox {
    /// Creates a bare placeholder box with no book assigned.
    pub fn unconfigured(box_number: u32) -> Self {
        TicketBox {
            box_number,
            ticket_price_cents: 0,
            total_tickets_per_book: 0,
            starting_ticket_number: 0,
            last_scanned_ticket_number: None,
            tickets_sold: 0,
            total_amount_sold_cents: 0,
            is_configured: false,
            game_number: None,
            book_number: None,
        }
    }

    /// The ticket number the engine expects to compare the next scan against:
    /// the last scanned number, or the starting number if nothing has been
    /// scanned this book.
    #[inline]
    pub fn reference_number(&self) -> i64 {
        self.last_scanned_ticket_number
            .unwrap_or(self.starting_ticket_number)
    }

    /// Returns the current ticket price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.ticket_price_cents)
    }

    /// True if this box recorded any sales today.
    #[inline]
    pub fn has_sales(&self) -> bool {
        self.tickets_sold > 0
    }
}

// =============================================================================
// Scan Result
// =============================================================================

/// The outcome of one successfully applied scan.
///
/// When a scan triggered a book transition, `tickets_sold` and
/// `amount_sold_cents` include the outgoing book's remainder in addition to
/// this scan's own figures, and `book_transition` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub box_number: u32,
    pub ticket_number: i64,
    pub tickets_sold: i64,
    pub amount_sold_cents: i64,
    /// Operator-facing message ("Sold 5 tickets for $25.00").
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Game number decoded from the barcode (absent for manual entry).
    pub game_number: Option<String>,
    /// Book number decoded from the barcode (absent for manual entry).
    pub book_number: Option<String>,
    /// True if this scan rolled the box over to a new book.
    pub book_transition: bool,
}

// =============================================================================
// Daily Counter
// =============================================================================

/// Per-box counters persisted against a business date.
///
/// These back the "same day restore" path: if the app restarts mid-day, the
/// current day's counts are reloaded from the store instead of starting at
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    pub box_number: u32,
    pub tickets_sold: i64,
    pub total_amount_sold_cents: i64,
}

// =============================================================================
// Daily Summary (archive)
// =============================================================================

/// One archived business day: store-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// UUID v4.
    pub id: String,
    pub summary_date: NaiveDate,
    /// Weekday name ("Monday"), denormalized for day-of-week reporting.
    pub day_of_week: String,
    pub total_tickets_sold: i64,
    pub total_amount_sold_cents: i64,
    /// Number of boxes that recorded sales that day.
    pub active_boxes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One box's archived figures within a [`DailySummary`].
///
/// Carries the price and stopping position at archive time so historical
/// rows stay correct even after the box is reconfigured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBoxSale {
    /// UUID v4.
    pub id: String,
    /// Parent summary id.
    pub summary_id: String,
    pub box_number: u32,
    pub ticket_price_cents: i64,
    pub last_scanned_ticket_number: Option<i64>,
    pub tickets_sold: i64,
    pub total_amount_sold_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sync Outbox
// =============================================================================

/// An entry in the sync outbox queue.
///
/// Failed background writes are parked here and retried; upserts are keyed
/// by natural identity, so at-least-once delivery is safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutboxEntry {
    pub id: String,
    pub owner_id: String,
    /// Type of entity being synced: "BOX", "GAME", "COUNTER", "SETTINGS".
    pub entity_type: String,
    /// Natural key of the entity being synced (e.g. box number).
    pub entity_id: String,
    /// The full entity data as JSON.
    pub payload: String,
    /// Number of sync attempts.
    pub attempts: i64,
    /// Last error context if sync failed (generic, never raw driver text).
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When last sync was attempted.
    pub attempted_at: Option<DateTime<Utc>>,
    /// When successfully synced.
    pub synced_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
