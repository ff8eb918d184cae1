//! # lotto-db: Database Layer for Lotto POS
//!
//! This crate provides database access for the Lotto POS scan-reconciliation
//! system. It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Lotto POS Data Flow                               │
//! │                                                                         │
//! │  Scan applied in lotto-core (TicketSession)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lotto-sync flush task                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     lotto-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (boxes.rs ...)│    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BoxRepo       │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ GameRepo      │    │              │  │   │
//! │  │   │               │    │ SummaryRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (lotto.db)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (boxes, games, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lotto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/lotto.db")).await?;
//! let boxes = db.boxes().list(owner_id, StateCode::Md).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::boxes::BoxRepository;
pub use repository::counters::CounterRepository;
pub use repository::games::GameRepository;
pub use repository::outbox::OutboxRepository;
pub use repository::settings::SettingsRepository;
pub use repository::summaries::SummaryRepository;
