//! # lotto-sync: Background Persistence for Lotto POS
//!
//! Keeps the on-disk store in step with the in-memory ticket session without
//! ever blocking the scan path.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Persistence Pipeline                             │
//! │                                                                         │
//! │  TicketSession applies a scan (synchronous, in-memory, lotto-core)     │
//! │       │                                                                 │
//! │       │ SyncHandle::flush_box(...)   fire-and-forget                   │
//! │       ▼                                                                 │
//! │  SyncAgent worker (agent.rs)                                            │
//! │       │ single task, FIFO, writes in enqueue order                     │
//! │       │                                                                 │
//! │       ├── write ok ──────────────→ done                                │
//! │       └── write failed ──────────→ parked in sync_outbox               │
//! │                                         │                               │
//! │                                         ▼                               │
//! │  OutboxProcessor (outbox.rs)   periodic replay, max 10 attempts        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures never surface raw driver errors: the operator-visible message is
//! always [`GENERIC_SAVE_ERROR`], and the in-memory session keeps the data
//! either way.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lotto_sync::{business_date_today, SyncAgent, SyncConfig};
//!
//! let (handle, worker) = SyncAgent::spawn(db.clone(), SyncConfig::default());
//! handle.flush_box(state, business_date_today(), &ticket_box)?;
//! // ...
//! handle.shutdown();
//! worker.await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod error;
pub mod outbox;
pub mod payload;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{business_date_today, SyncAgent, SyncConfig, SyncHandle};
pub use error::{SyncError, SyncResult, GENERIC_SAVE_ERROR};
pub use outbox::{OutboxConfig, OutboxProcessor, OutboxProcessorHandle, MAX_RETRY_ATTEMPTS};
pub use payload::ArchivedBoxSale;

// Domain types callers need when enqueueing work
pub use lotto_core::types::{GameInfo, StateCode, StoreSettings, TicketBox, TicketOrder};
