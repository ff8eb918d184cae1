//! # Store Settings Repository
//!
//! One settings row per owner: jurisdiction and ticket counting direction.
//! The mid-day mutability rule lives in the engine, not here; by the time a
//! write reaches this repository it has already been allowed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use lotto_core::types::{StateCode, StoreSettings, TicketOrder};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    state_code: StateCode,
    ticket_order: TicketOrder,
}

impl From<SettingsRow> for StoreSettings {
    fn from(row: SettingsRow) -> Self {
        StoreSettings {
            state_code: row.state_code,
            ticket_order: row.ticket_order,
        }
    }
}

/// Repository for store settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads an owner's settings.
    ///
    /// ## Returns
    /// `None` for a brand-new owner; callers fall back to
    /// `StoreSettings::default()` (Maryland, descending).
    pub async fn get(&self, owner_id: &str) -> DbResult<Option<StoreSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT state_code, ticket_order FROM store_settings WHERE owner_id = ?1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoreSettings::from))
    }

    /// Inserts or updates an owner's settings.
    pub async fn upsert(&self, owner_id: &str, settings: StoreSettings) -> DbResult<()> {
        debug!(
            state = %settings.state_code,
            order = %settings.ticket_order,
            "Upserting store settings"
        );

        let now: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO store_settings (owner_id, state_code, ticket_order, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (owner_id) DO UPDATE SET
                state_code = excluded.state_code,
                ticket_order = excluded.ticket_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(settings.state_code)
        .bind(settings.ticket_order)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
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

    #[tokio::test]
    async fn test_missing_settings_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let loaded = db.settings().get(DEFAULT_OWNER_ID).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_upsert_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        repo.upsert(DEFAULT_OWNER_ID, StoreSettings::default())
            .await
            .unwrap();

        let loaded = repo.get(DEFAULT_OWNER_ID).await.unwrap().unwrap();
        assert_eq!(loaded, StoreSettings::default());

        // Flip to DC / ascending.
        let dc = StoreSettings {
            state_code: StateCode::Dc,
            ticket_order: TicketOrder::Ascending,
        };
        repo.upsert(DEFAULT_OWNER_ID, dc).await.unwrap();

        let loaded = repo.get(DEFAULT_OWNER_ID).await.unwrap().unwrap();
        assert_eq!(loaded, dc);
    }
}
