//! # Game Repository
//!
//! Persistence for the game registry: price and book capacity remembered
//! per game number, scoped by owner and jurisdiction.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotto_core::types::{GameInfo, StateCode};

#[derive(Debug, sqlx::FromRow)]
struct GameRow {
    game_number: String,
    ticket_price_cents: i64,
    total_tickets_per_book: i64,
}

impl From<GameRow> for GameInfo {
    fn from(row: GameRow) -> Self {
        GameInfo {
            game_number: row.game_number,
            ticket_price_cents: row.ticket_price_cents,
            total_tickets_per_book: row.total_tickets_per_book,
        }
    }
}

/// Repository for game registry operations.
#[derive(Debug, Clone)]
pub struct GameRepository {
    pool: SqlitePool,
}

impl GameRepository {
    /// Creates a new GameRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GameRepository { pool }
    }

    /// Lists all known games, ordered by game number.
    pub async fn list(&self, owner_id: &str, state: StateCode) -> DbResult<Vec<GameInfo>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT game_number, ticket_price_cents, total_tickets_per_book
            FROM games
            WHERE owner_id = ?1 AND state_code = ?2
            ORDER BY game_number
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GameInfo::from).collect())
    }

    /// Inserts or updates a game.
    ///
    /// The in-memory registry decides whether an existing entry may change
    /// (register never overwrites, update always does); by the time a flush
    /// reaches this repository the decision is made, so a plain upsert is
    /// correct for both paths.
    pub async fn upsert(&self, owner_id: &str, state: StateCode, game: &GameInfo) -> DbResult<()> {
        debug!(game_number = %game.game_number, "Upserting game");

        let now: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO games (
                owner_id, state_code, game_number,
                ticket_price_cents, total_tickets_per_book,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (owner_id, state_code, game_number) DO UPDATE SET
                ticket_price_cents = excluded.ticket_price_cents,
                total_tickets_per_book = excluded.total_tickets_per_book,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(state)
        .bind(&game.game_number)
        .bind(game.ticket_price_cents)
        .bind(game.total_tickets_per_book)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a game.
    ///
    /// Box rows referencing the game are left alone (no-cascade): the box
    /// keeps its last-known price and capacity until reconfigured.
    pub async fn delete(&self, owner_id: &str, state: StateCode, game_number: &str) -> DbResult<()> {
        debug!(game_number, "Deleting game");

        let result = sqlx::query(
            "DELETE FROM games WHERE owner_id = ?1 AND state_code = ?2 AND game_number = ?3",
        )
        .bind(owner_id)
        .bind(state)
        .bind(game_number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Game", game_number));
        }

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

    fn game(number: &str) -> GameInfo {
        GameInfo {
            game_number: number.to_string(),
            ticket_price_cents: 500,
            total_tickets_per_book: 60,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_list_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.games();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &game("746"))
            .await
            .unwrap();
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &game("102"))
            .await
            .unwrap();

        let games = repo.list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].game_number, "102");
        assert_eq!(games[1].game_number, "746");
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.games();

        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &game("746"))
            .await
            .unwrap();

        let mut edited = game("746");
        edited.ticket_price_cents = 1000;
        repo.upsert(DEFAULT_OWNER_ID, StateCode::Md, &edited)
            .await
            .unwrap();

        let games = repo.list(DEFAULT_OWNER_ID, StateCode::Md).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].ticket_price_cents, 1000);
    }

    #[tokio::test]
    async fn test_delete_missing_game() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.games();

        let err = repo
            .delete(DEFAULT_OWNER_ID, StateCode::Md, "999")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
