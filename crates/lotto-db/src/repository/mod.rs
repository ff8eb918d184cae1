//! # Repository Module
//!
//! Database repository implementations for Lotto POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Sync flush task                                                       │
//! │       │                                                                 │
//! │       │  db.boxes().upsert(owner, state, &tb)                           │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BoxRepository                                                         │
//! │  ├── list(&self, owner, state)                                         │
//! │  ├── upsert(&self, owner, state, tb)                                   │
//! │  └── delete(&self, owner, state, box_number)                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • lotto-core stays free of any I/O                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`boxes::BoxRepository`] - Ticket box persistence
//! - [`games::GameRepository`] - Game registry persistence
//! - [`counters::CounterRepository`] - Per-day counters (same-day restore)
//! - [`settings::SettingsRepository`] - Store settings
//! - [`summaries::SummaryRepository`] - Archived day history
//! - [`outbox::OutboxRepository`] - Failed-write retry queue

pub mod boxes;
pub mod counters;
pub mod games;
pub mod outbox;
pub mod settings;
pub mod summaries;
