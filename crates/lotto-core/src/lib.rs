//! # lotto-core: Pure Business Logic for Lotto POS
//!
//! This crate is the **heart** of Lotto POS. It tracks scratch-off lottery
//! ticket books sold from numbered display boxes: clerks scan the barcode of
//! whichever ticket currently sits at the top of a book, and the engine
//! infers how many tickets were sold since the last scan.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lotto POS Architecture                           │
//! │                                                                         │
//! │  Scanner / Operator Input                                              │
//! │       │ raw barcode or manual ticket number                            │
//! │  ┌────▼────────────────────────────────────────────────────────────┐   │
//! │  │               ★ lotto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  barcode  │  │  engine   │  │ registry  │  │   types   │  │   │
//! │  │   │  parsing  │  │ scan/undo │  │ GameInfo  │  │ TicketBox │  │   │
//! │  │   │ MD and DC │  │  + reset  │  │  lookup   │  │ ScanResult│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └────┬────────────────────────────────────────────────────────────┘   │
//! │       │ updated boxes + ScanResult | ScanError                         │
//! │  ┌────▼────────────────────────────────────────────────────────────┐   │
//! │  │                    lotto-db / lotto-sync                        │   │
//! │  │        SQLite persistence, write-behind sync, day archive       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (TicketBox, GameInfo, ScanResult, settings)
//! - [`barcode`] - Jurisdiction-specific barcode decoding
//! - [`registry`] - Known-game registry (price and tickets per book)
//! - [`engine`] - The scan reconciliation engine ([`engine::TicketSession`])
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Typed scan and domain errors
//! - [`validation`] - Input validation for box/book configuration
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every operation is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Typed Errors**: Scan failures are values, never panics or strings
//! 5. **Strong Atomicity**: A box's state changes only when a scan fully validates
//!
//! ## Example Usage
//!
//! ```rust
//! use lotto_core::engine::TicketSession;
//! use lotto_core::types::StoreSettings;
//!
//! let mut session = TicketSession::new(StoreSettings::default());
//! session
//!     .add_book_to_box(1, "746", "047551", 500, 60, 60)
//!     .unwrap();
//!
//! // Ticket numbers count down from 60; scanning #55 means 5 were sold.
//! let result = session.process_manual_entry("55", 1).unwrap();
//! assert_eq!(result.tickets_sold, 5);
//! assert_eq!(result.amount_sold_cents, 2500); // $25.00 at $5 per ticket
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod engine;
pub mod error;
pub mod money;
pub mod registry;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use lotto_core::Money` instead of
// `use lotto_core::money::Money`

pub use barcode::DecodedBarcode;
pub use engine::{ResetMode, SessionTotals, TicketSession};
pub use error::{CoreError, CoreResult, ScanError, ValidationError};
pub use money::Money;
pub use registry::GameRegistry;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default owner ID for v0.1 (single-owner runtime with multi-owner schema)
///
/// ## Why a constant?
/// v0.1 runs for a single store owner, but every persisted row is keyed by
/// owner_id so that multi-store accounts can be added without a schema
/// change. This constant will be replaced by session-derived owners later.
pub const DEFAULT_OWNER_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum number of display boxes a store can track.
///
/// ## Business Reason
/// Matches the largest scratch-off display racks in use; also bounds the
/// work done per daily reset and per archive.
pub const MAX_BOXES: u32 = 70;

/// Number of scan results kept in the in-memory history.
///
/// ## Business Reason
/// The history exists so a clerk can eyeball the last few scans and undo a
/// mistake; it is not an audit log, so it is capped rather than unbounded.
pub const MAX_SCAN_HISTORY: usize = 50;
