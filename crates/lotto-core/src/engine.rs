//! # Reconciliation Engine
//!
//! The scan reconciliation state machine. Given a decoded scan and a target
//! box, it validates the scan against the box's expected position, computes
//! how many tickets were sold since the last scan, detects book rollovers,
//! and applies the result to the box's daily counters.
//!
//! ## Per-Scan State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     processScan (one call, one box)                     │
//! │                                                                         │
//! │  Idle                                                                  │
//! │   │                                                                     │
//! │   ▼                                                                     │
//! │  ParseBarcode ──── invalid ────────────────► invalid_barcode           │
//! │   │                                                                     │
//! │   ▼                                                                     │
//! │  BoxLookup ─────── missing/unconfigured ───► box_not_configured        │
//! │   │                                                                     │
//! │   ▼                                                                     │
//! │  TransitionCheck ─ new game not in registry ► unknown_game             │
//! │   │      (same game+book: no-op; new book: credit old remainder)       │
//! │   ▼                                                                     │
//! │  SequenceValidate ─ duplicate ─────────────► duplicate_scan            │
//! │   │               └ wrong direction ───────► invalid_sequence          │
//! │   ▼                                                                     │
//! │  CapacityCheck ─── over printed total ─────► exceeds_book              │
//! │   │                                                                     │
//! │   ▼                                                                     │
//! │  Apply ──► box updated, undo snapshot stored, history appended         │
//! │                                                                         │
//! │  ANY failing step aborts with ZERO mutation: all checks run against    │
//! │  a working copy, and the stored box is replaced only on full success.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session Lifecycle
//! The engine state lives in a [`TicketSession`]: explicit owned collections
//! loaded from the store, mutated by scan/config calls, and flushed back by
//! the sync layer. There are no ambient singletons.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::barcode::{normalize_book_number, DecodedBarcode};
use crate::error::{CoreError, CoreResult, ScanError};
use crate::money::Money;
use crate::registry::GameRegistry;
use crate::types::{DailyCounter, GameInfo, ScanResult, StateCode, StoreSettings, TicketBox, TicketOrder};
use crate::validation::{
    parse_manual_ticket, validate_box_number, validate_game_number, validate_price_cents,
    validate_starting_ticket, validate_tickets_per_book,
};
use crate::{MAX_BOXES, MAX_SCAN_HISTORY};

// =============================================================================
// Reset Mode
// =============================================================================

/// How a daily reset treats each box's scanning position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Today's stopping point becomes tomorrow's reference: for every box
    /// that was scanned, `starting_ticket_number` takes the last scanned
    /// value. Used when archiving the day to history.
    PreservePosition,

    /// Counters are zeroed but `starting_ticket_number` is left untouched,
    /// so the same tickets can be re-scanned. Used to recover from
    /// operator error ("reset without saving").
    DiscardPosition,
}

// =============================================================================
// Session Totals
// =============================================================================

/// Store-wide totals across configured boxes for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTotals {
    pub total_tickets_sold: i64,
    pub total_amount_sold_cents: i64,
    /// Boxes that recorded at least one sale today.
    pub active_boxes: usize,
}

// =============================================================================
// Undo Snapshot
// =============================================================================

/// The box's full state immediately before its most recent applied scan,
/// plus the result that scan produced. At most one per box; replaced on the
/// next scan to that box, consumed by a successful undo.
#[derive(Debug, Clone)]
struct UndoSnapshot {
    box_before: TicketBox,
    result: ScanResult,
}

/// Scan input after the format-specific front door.
enum ScanInput {
    /// Barcode path: carries game/book context for transition detection.
    Barcode(DecodedBarcode),
    /// Manual path: a bare ticket number, no game/book context.
    Manual(i64),
}

// =============================================================================
// Ticket Session
// =============================================================================

/// The aggregate "inventory session": tracked boxes, the game registry,
/// store settings, scan history, and undo snapshots.
///
/// ## Lifecycle
/// ```text
/// init:   TicketSession::from_store(boxes, games, settings)
/// mutate: process_barcode / process_manual_entry / undo / config calls
/// flush:  sync layer reads back boxes()/known_games() and persists
/// ```
#[derive(Debug)]
pub struct TicketSession {
    boxes: BTreeMap<u32, TicketBox>,
    registry: GameRegistry,
    settings: StoreSettings,
    /// Most-recent-first, capped at [`MAX_SCAN_HISTORY`].
    scan_history: Vec<ScanResult>,
    last_scan_result: Option<ScanResult>,
    undo_snapshots: HashMap<u32, UndoSnapshot>,
}

impl TicketSession {
    /// Creates an empty session with the given settings.
    pub fn new(settings: StoreSettings) -> Self {
        TicketSession {
            boxes: BTreeMap::new(),
            registry: GameRegistry::new(),
            settings,
            scan_history: Vec::new(),
            last_scan_result: None,
            undo_snapshots: HashMap::new(),
        }
    }

    /// Builds a session from state loaded out of the persistence store.
    pub fn from_store(boxes: Vec<TicketBox>, games: Vec<GameInfo>, settings: StoreSettings) -> Self {
        TicketSession {
            boxes: boxes.into_iter().map(|b| (b.box_number, b)).collect(),
            registry: GameRegistry::from_games(games),
            settings,
            scan_history: Vec::new(),
            last_scan_result: None,
            undo_snapshots: HashMap::new(),
        }
    }

    /// Re-applies persisted same-day counters after a restart.
    ///
    /// Counters for boxes that no longer exist are ignored.
    pub fn restore_counters(&mut self, counters: &[DailyCounter]) {
        for counter in counters {
            if let Some(tb) = self.boxes.get_mut(&counter.box_number) {
                tb.tickets_sold = counter.tickets_sold;
                tb.total_amount_sold_cents = counter.total_amount_sold_cents;
            }
        }
    }

    // =========================================================================
    // Scan Processing
    // =========================================================================

    /// Processes a scanned barcode against the selected box.
    ///
    /// ## Errors
    /// Any of the [`ScanError`] taxonomy; the box is untouched on Err.
    pub fn process_barcode(&mut self, raw: &str, box_number: u32) -> Result<ScanResult, ScanError> {
        let decoded = self
            .settings
            .state_code
            .parse_barcode(raw)
            .ok_or_else(|| ScanError::InvalidBarcode {
                hint: self.settings.state_code.barcode_hint().to_string(),
            })?;

        self.apply(box_number, ScanInput::Barcode(decoded), false)
    }

    /// Processes a manually entered ticket number against the selected box.
    ///
    /// Manual entries never carry game/book context, so they can never
    /// trigger a book transition; everything else validates identically.
    pub fn process_manual_entry(&mut self, input: &str, box_number: u32) -> Result<ScanResult, ScanError> {
        let ticket_number =
            parse_manual_ticket(input).ok_or_else(|| ScanError::InvalidBarcode {
                hint: "Enter a non-negative whole ticket number.".to_string(),
            })?;

        self.apply(box_number, ScanInput::Manual(ticket_number), true)
    }

    /// Core validate-and-apply path shared by both scan entry points.
    ///
    /// All mutation happens on a working copy; `self` changes only after
    /// every check passes.
    fn apply(
        &mut self,
        box_number: u32,
        input: ScanInput,
        is_manual: bool,
    ) -> Result<ScanResult, ScanError> {
        let stored = self
            .boxes
            .get(&box_number)
            .filter(|b| b.is_configured)
            .ok_or(ScanError::BoxNotConfigured { box_number })?;

        let original = stored.clone();
        let mut working = original.clone();

        let ticket_number = match &input {
            ScanInput::Barcode(d) => d.ticket_number,
            ScanInput::Manual(t) => *t,
        };

        // ---------------------------------------------------------------------
        // Book-transition detection (barcode path only)
        // ---------------------------------------------------------------------
        let mut remaining_sold = 0i64;
        let mut remaining_amount = Money::zero();
        let mut transitioned = false;

        if let ScanInput::Barcode(decoded) = &input {
            let same_game = working.game_number.as_deref() == Some(decoded.game_number.as_str());
            let same_book = working.book_number.as_deref() == Some(decoded.book_number.as_str());

            if same_game && !same_book {
                // New book of the game already in the box. The registry entry
                // tells us where a fresh book starts; fall back to the box's
                // own capacity for pre-registry data.
                let per_book = self
                    .registry
                    .lookup(&decoded.game_number)
                    .map(|g| g.total_tickets_per_book)
                    .unwrap_or(working.total_tickets_per_book);

                roll_over_book(&mut working, decoded, per_book, None);
                remaining_sold = working.tickets_sold - original.tickets_sold;
                remaining_amount =
                    Money::from_cents(working.total_amount_sold_cents - original.total_amount_sold_cents);
                transitioned = true;
            } else if !same_game {
                // A different game must already be known; auto-creating a game
                // from a bare scan would invent its price.
                let game = self
                    .registry
                    .lookup(&decoded.game_number)
                    .cloned()
                    .ok_or_else(|| ScanError::UnknownGame {
                        game_number: decoded.game_number.clone(),
                    })?;

                let per_book = game.total_tickets_per_book;
                roll_over_book(&mut working, decoded, per_book, Some(&game));
                remaining_sold = working.tickets_sold - original.tickets_sold;
                remaining_amount =
                    Money::from_cents(working.total_amount_sold_cents - original.total_amount_sold_cents);
                transitioned = true;
            }
            // Same game, same book: no transition, box unchanged by this step.
        }

        // ---------------------------------------------------------------------
        // Core validation (against the possibly just-transitioned state)
        // ---------------------------------------------------------------------
        let reference = working.reference_number();

        // Duplicate check. The tickets_sold > 0 guard avoids a false positive
        // on the first scan of a fresh day, when the carried-over reference can
        // legitimately equal the first real scan.
        if let Some(last) = working.last_scanned_ticket_number {
            if last == ticket_number && working.tickets_sold > 0 {
                return Err(ScanError::DuplicateScan { ticket_number });
            }
        }

        let order = self.settings.ticket_order;
        let out_of_order = match order {
            TicketOrder::Descending => ticket_number > reference,
            TicketOrder::Ascending => ticket_number < reference,
        };
        if out_of_order {
            return Err(ScanError::InvalidSequence {
                ticket_number,
                reference,
                order,
            });
        }

        // Always >= 0 given the sequence check passed.
        let sold_this_scan = match order {
            TicketOrder::Descending => reference - ticket_number,
            TicketOrder::Ascending => ticket_number - reference,
        };

        // Capacity check: equal to the printed total is allowed, exceeding is
        // not. Suppressed right after a transition, whose remainder was
        // already accounted against the outgoing book.
        let would_sell = working.tickets_sold + sold_this_scan;
        if !transitioned && would_sell > working.total_tickets_per_book {
            return Err(ScanError::ExceedsBook {
                would_sell,
                capacity: working.total_tickets_per_book,
            });
        }

        // Amount at the box's current price, which a cross-game transition
        // may have just updated.
        let amount_this_scan = working.price().multiply_quantity(sold_this_scan);

        // ---------------------------------------------------------------------
        // Apply
        // ---------------------------------------------------------------------
        working.last_scanned_ticket_number = Some(ticket_number);
        working.tickets_sold += sold_this_scan;
        working.total_amount_sold_cents += amount_this_scan.cents();

        let total_sold = sold_this_scan + remaining_sold;
        let total_amount = amount_this_scan + remaining_amount;

        let (game_number, book_number) = match &input {
            ScanInput::Barcode(d) => (Some(d.game_number.clone()), Some(d.book_number.clone())),
            ScanInput::Manual(_) => (None, None),
        };

        let message = scan_message(total_sold, total_amount, remaining_sold, transitioned, is_manual);

        let result = ScanResult {
            box_number,
            ticket_number,
            tickets_sold: total_sold,
            amount_sold_cents: total_amount.cents(),
            message,
            timestamp: Utc::now(),
            game_number,
            book_number,
            book_transition: transitioned,
        };

        self.undo_snapshots.insert(
            box_number,
            UndoSnapshot {
                box_before: original,
                result: result.clone(),
            },
        );
        self.boxes.insert(box_number, working);

        self.scan_history.insert(0, result.clone());
        self.scan_history.truncate(MAX_SCAN_HISTORY);
        self.last_scan_result = Some(result.clone());

        Ok(result)
    }

    // =========================================================================
    // Undo
    // =========================================================================

    /// Reverts the most recent scan applied to a box.
    ///
    /// Single-use: the snapshot is consumed, so a second consecutive undo on
    /// the same box returns `false` and changes nothing.
    ///
    /// ## Returns
    /// Whether an undo was available and performed.
    pub fn undo(&mut self, box_number: u32) -> bool {
        let Some(snapshot) = self.undo_snapshots.remove(&box_number) else {
            return false;
        };

        self.boxes.insert(box_number, snapshot.box_before);

        // Drop exactly the history entry this snapshot produced.
        self.scan_history.retain(|r| {
            !(r.box_number == box_number && r.timestamp == snapshot.result.timestamp)
        });

        if self
            .last_scan_result
            .as_ref()
            .is_some_and(|r| r.box_number == box_number)
        {
            self.last_scan_result = None;
        }

        true
    }

    // =========================================================================
    // Daily Reset
    // =========================================================================

    /// End-of-day reset.
    ///
    /// Both modes zero the daily counters and clear scan history, the undo
    /// map and the last result; an undo is never valid across a reset
    /// boundary. See [`ResetMode`] for how the scanning position is treated.
    pub fn reset_daily(&mut self, mode: ResetMode) {
        for tb in self.boxes.values_mut() {
            match mode {
                ResetMode::PreservePosition => {
                    if let Some(last) = tb.last_scanned_ticket_number {
                        tb.starting_ticket_number = last;
                    }
                    tb.last_scanned_ticket_number = None;
                }
                ResetMode::DiscardPosition => {
                    tb.last_scanned_ticket_number = None;
                }
            }
            tb.tickets_sold = 0;
            tb.total_amount_sold_cents = 0;
        }

        self.scan_history.clear();
        self.undo_snapshots.clear();
        self.last_scan_result = None;
    }

    // =========================================================================
    // Box Lifecycle
    // =========================================================================

    /// Creates an unconfigured placeholder box at the lowest unused number.
    ///
    /// ## Returns
    /// The new box number.
    pub fn add_box(&mut self) -> CoreResult<u32> {
        let next = (1..=MAX_BOXES).find(|n| !self.boxes.contains_key(n));
        let Some(box_number) = next else {
            return Err(CoreError::BoxLimitReached { max: MAX_BOXES });
        };

        self.boxes
            .insert(box_number, TicketBox::unconfigured(box_number));
        Ok(box_number)
    }

    /// Creates an unconfigured placeholder box at an explicit number.
    ///
    /// ## Returns
    /// `true` if created, `false` if the number was already taken (no-op).
    pub fn add_box_with_number(&mut self, box_number: u32) -> CoreResult<bool> {
        validate_box_number(box_number)?;

        if self.boxes.contains_key(&box_number) {
            return Ok(false);
        }

        self.boxes
            .insert(box_number, TicketBox::unconfigured(box_number));
        Ok(true)
    }

    /// Assigns a book to a box, configuring or re-configuring it.
    ///
    /// This is the only way an unconfigured box gains game context, and also
    /// the explicit way to replace an already-loaded book (as opposed to a
    /// scan-driven transition). The game is registered idempotently; daily
    /// counters and the scan position are reset for the new book.
    #[allow(clippy::too_many_arguments)]
    pub fn add_book_to_box(
        &mut self,
        box_number: u32,
        game_number: &str,
        book_number: &str,
        ticket_price_cents: i64,
        total_tickets_per_book: i64,
        starting_ticket_number: i64,
    ) -> CoreResult<()> {
        validate_box_number(box_number)?;
        validate_game_number(game_number)?;
        validate_price_cents(ticket_price_cents)?;
        validate_tickets_per_book(total_tickets_per_book)?;
        validate_starting_ticket(starting_ticket_number)?;

        let game_number = game_number.trim();

        // Remember the game so future books and transitions can reuse it.
        // Never overwrites an existing entry.
        self.registry.register(GameInfo {
            game_number: game_number.to_string(),
            ticket_price_cents,
            total_tickets_per_book,
        });

        // DC book numbers are normalized so manual configuration matches
        // whichever shape the scanner later produces.
        let book_number = match self.settings.state_code {
            StateCode::Md => book_number.to_string(),
            StateCode::Dc => normalize_book_number(book_number),
        };

        let tb = self
            .boxes
            .entry(box_number)
            .or_insert_with(|| TicketBox::unconfigured(box_number));

        tb.ticket_price_cents = ticket_price_cents;
        tb.total_tickets_per_book = total_tickets_per_book;
        tb.starting_ticket_number = starting_ticket_number;
        tb.last_scanned_ticket_number = None;
        tb.tickets_sold = 0;
        tb.total_amount_sold_cents = 0;
        tb.is_configured = true;
        tb.game_number = Some(game_number.to_string());
        tb.book_number = Some(book_number);

        // Replacing the book invalidates any pending undo for this box.
        self.undo_snapshots.remove(&box_number);

        Ok(())
    }

    /// Removes a box from the session.
    ///
    /// Irreversible. The removed box is returned so the caller can also
    /// delete its archived current-day counters from the store.
    pub fn remove_box(&mut self, box_number: u32) -> CoreResult<TicketBox> {
        let removed = self
            .boxes
            .remove(&box_number)
            .ok_or(CoreError::BoxNotFound(box_number))?;

        self.undo_snapshots.remove(&box_number);

        Ok(removed)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Replaces the store settings.
    ///
    /// Rejected while any box has nonzero sales: the counting semantics
    /// cannot change mid-day.
    pub fn update_settings(&mut self, settings: StoreSettings) -> CoreResult<()> {
        if self.boxes.values().any(|b| b.has_sales()) {
            return Err(CoreError::SettingsLocked);
        }

        self.settings = settings;
        Ok(())
    }

    /// The current store settings.
    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    // =========================================================================
    // Game Registry Passthrough
    // =========================================================================

    /// Registers a game explicitly (idempotent, never overwrites).
    pub fn register_game(
        &mut self,
        game_number: &str,
        ticket_price_cents: i64,
        total_tickets_per_book: i64,
    ) -> CoreResult<bool> {
        validate_game_number(game_number)?;
        validate_price_cents(ticket_price_cents)?;
        validate_tickets_per_book(total_tickets_per_book)?;

        Ok(self.registry.register(GameInfo {
            game_number: game_number.trim().to_string(),
            ticket_price_cents,
            total_tickets_per_book,
        }))
    }

    /// Edits an existing game's price and capacity.
    pub fn update_game(
        &mut self,
        game_number: &str,
        ticket_price_cents: i64,
        total_tickets_per_book: i64,
    ) -> CoreResult<()> {
        validate_price_cents(ticket_price_cents)?;
        validate_tickets_per_book(total_tickets_per_book)?;

        if !self
            .registry
            .update(game_number, ticket_price_cents, total_tickets_per_book)
        {
            return Err(CoreError::GameNotFound(game_number.to_string()));
        }

        Ok(())
    }

    /// Deletes a game from the registry.
    ///
    /// Boxes referencing the game are NOT touched: they keep their
    /// last-known price and capacity until manually reconfigured.
    pub fn delete_game(&mut self, game_number: &str) -> Option<GameInfo> {
        self.registry.remove(game_number)
    }

    /// Known games, ordered by game number.
    pub fn known_games(&self) -> impl Iterator<Item = &GameInfo> {
        self.registry.games()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// A single box's state.
    pub fn box_state(&self, box_number: u32) -> Option<&TicketBox> {
        self.boxes.get(&box_number)
    }

    /// All boxes, ordered by box number.
    pub fn boxes(&self) -> impl Iterator<Item = &TicketBox> {
        self.boxes.values()
    }

    /// Configured boxes only, ordered by box number.
    pub fn configured_boxes(&self) -> impl Iterator<Item = &TicketBox> {
        self.boxes.values().filter(|b| b.is_configured)
    }

    /// Recent scans, most recent first (capped).
    pub fn scan_history(&self) -> &[ScanResult] {
        &self.scan_history
    }

    /// The most recent scan result, if it hasn't been undone or reset.
    pub fn last_scan_result(&self) -> Option<&ScanResult> {
        self.last_scan_result.as_ref()
    }

    /// Store-wide totals across configured boxes.
    pub fn totals(&self) -> SessionTotals {
        let mut total_tickets_sold = 0;
        let mut total_amount = Money::zero();
        let mut active_boxes = 0;

        for tb in self.configured_boxes() {
            total_tickets_sold += tb.tickets_sold;
            total_amount += Money::from_cents(tb.total_amount_sold_cents);
            if tb.has_sales() {
                active_boxes += 1;
            }
        }

        SessionTotals {
            total_tickets_sold,
            total_amount_sold_cents: total_amount.cents(),
            active_boxes,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Rolls a box over to a new book, crediting the outgoing book's unsold
/// remainder as sold at the OLD price before any new-book state is adopted.
fn roll_over_book(
    working: &mut TicketBox,
    decoded: &DecodedBarcode,
    per_book: i64,
    new_game: Option<&GameInfo>,
) {
    // Everything left in the outgoing book counts as sold: its reference
    // position IS the number of unsold tickets in a countdown book.
    let remaining = working.reference_number();
    working.tickets_sold += remaining;
    working.total_amount_sold_cents += working.price().multiply_quantity(remaining).cents();

    if let Some(game) = new_game {
        working.game_number = Some(game.game_number.clone());
        working.ticket_price_cents = game.ticket_price_cents;
        working.total_tickets_per_book = game.total_tickets_per_book;
    }

    working.book_number = Some(decoded.book_number.clone());
    // A fresh book starts at its full printed count.
    working.starting_ticket_number = per_book;
    working.last_scanned_ticket_number = None;
}

/// Builds the operator-facing message for a successful scan.
fn scan_message(
    total_sold: i64,
    amount: Money,
    remaining_sold: i64,
    transitioned: bool,
    is_manual: bool,
) -> String {
    if transitioned {
        format!(
            "New book started: sold {} tickets for {} ({} counted from the previous book).",
            total_sold, amount, remaining_sold
        )
    } else if is_manual {
        format!("Manual entry: Sold {} tickets for {}", total_sold, amount)
    } else {
        format!("Sold {} tickets for {}", total_sold, amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
