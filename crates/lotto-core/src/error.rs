//! # Error Types
//!
//! Domain-specific error types for lotto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lotto-core errors (this file)                                         │
//! │  ├── ScanError        - Scan rejections, returned as values            │
//! │  ├── CoreError        - Box/game/settings lifecycle failures           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lotto-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  lotto-sync errors (separate crate)                                    │
//! │  └── SyncError        - Background write failures (logged, swallowed)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Scan rejections are non-fatal values, never panics: the engine
//!    returns `Result<ScanResult, ScanError>` and mutates nothing on Err
//! 3. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::types::TicketOrder;

// =============================================================================
// Scan Error
// =============================================================================

/// A rejected scan.
///
/// All variants are non-fatal: the engine returns them as values and the
/// target box's state is untouched. `kind()` exposes the stable snake_case
/// tag the UI and logs key off.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanError {
    /// Input didn't match the jurisdiction's barcode format.
    #[error("Invalid barcode format. {hint}")]
    InvalidBarcode { hint: String },

    /// Target box has no active book.
    #[error("Box {box_number} is not configured. Please set it up first.")]
    BoxNotConfigured { box_number: u32 },

    /// A scanned game number has no registry entry.
    ///
    /// Only reachable on a game switch: a same-game book rollover never
    /// needs the registry to succeed, but adopting a brand-new game's price
    /// and capacity from a bare scan would be a guess.
    #[error("Game {game_number} is not set up yet. Add a book for it from box setup first.")]
    UnknownGame { game_number: String },

    /// Re-scan of the current reference ticket after at least one real
    /// sale this day.
    #[error("Ticket #{ticket_number} was already scanned.")]
    DuplicateScan { ticket_number: i64 },

    /// Ticket number violates the configured counting direction.
    #[error("Invalid sequence: ticket #{ticket_number} cannot follow #{reference} in {order} order.")]
    InvalidSequence {
        ticket_number: i64,
        reference: i64,
        order: TicketOrder,
    },

    /// Would sell more tickets than the book's printed capacity.
    #[error("Warning: this would exceed the book total ({would_sell} > {capacity}).")]
    ExceedsBook { would_sell: i64, capacity: i64 },
}

impl ScanError {
    /// Stable taxonomy tag for this error.
    pub const fn kind(&self) -> &'static str {
        match self {
            ScanError::InvalidBarcode { .. } => "invalid_barcode",
            ScanError::BoxNotConfigured { .. } => "box_not_configured",
            ScanError::UnknownGame { .. } => "unknown_game",
            ScanError::DuplicateScan { .. } => "duplicate_scan",
            ScanError::InvalidSequence { .. } => "invalid_sequence",
            ScanError::ExceedsBook { .. } => "exceeds_book",
        }
    }

    /// True for rejections that are warnings about operator input rather
    /// than configuration problems.
    pub const fn is_warning(&self) -> bool {
        matches!(self, ScanError::ExceedsBook { .. })
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Box/game/settings lifecycle errors.
///
/// These represent business rule violations outside the scan path.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Box number is not tracked by this session.
    #[error("Box not found: {0}")]
    BoxNotFound(u32),

    /// No free box number left under the box limit.
    #[error("Cannot add another box: limit of {max} reached")]
    BoxLimitReached { max: u32 },

    /// Game number has no registry entry.
    #[error("Game not found: {0}")]
    GameNotFound(String),

    /// Store settings may only change while no box has sales.
    ///
    /// ## Why
    /// Flipping the ticket order or jurisdiction mid-day would reinterpret
    /// the counters already accumulated under the old semantics.
    #[error("Settings are locked while today's counts are nonzero. Reset the day first.")]
    SettingsLocked,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when operator input doesn't meet requirements; they are
/// checked before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. non-numeric game number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
