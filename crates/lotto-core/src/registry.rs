//! # Game Registry
//!
//! The per-store mapping from game number to its known ticket price and
//! book capacity.
//!
//! ## Why a Registry?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A store sells the same handful of games week after week. The first    │
//! │  time a book for game 746 is configured, its price and capacity are    │
//! │  remembered here so that:                                              │
//! │                                                                         │
//! │  • adding the next 746 book pre-fills price and capacity               │
//! │  • a scan-driven book transition knows the fresh book's starting       │
//! │    position (its full printed count)                                   │
//! │  • a cross-game transition can adopt the new game's price              │
//! │                                                                         │
//! │  A scan for a game that was NEVER configured is rejected               │
//! │  (unknown_game) rather than guessed at.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use crate::types::GameInfo;

/// Registry of known games, keyed by game number.
///
/// BTreeMap keeps iteration ordered by game number, which is how the known
/// games list is displayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRegistry {
    games: BTreeMap<String, GameInfo>,
}

impl GameRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        GameRegistry {
            games: BTreeMap::new(),
        }
    }

    /// Builds a registry from previously persisted games.
    pub fn from_games(games: Vec<GameInfo>) -> Self {
        GameRegistry {
            games: games
                .into_iter()
                .map(|g| (g.game_number.clone(), g))
                .collect(),
        }
    }

    /// Registers a game if it is not already known.
    ///
    /// Idempotent: an existing entry is NEVER overwritten, so repeated
    /// "add book" calls for the same game keep the original price and
    /// capacity. Use [`GameRegistry::update`] for explicit edits.
    ///
    /// ## Returns
    /// `true` if the game was inserted, `false` if it already existed.
    pub fn register(&mut self, game: GameInfo) -> bool {
        if self.games.contains_key(&game.game_number) {
            return false;
        }
        self.games.insert(game.game_number.clone(), game);
        true
    }

    /// Overwrites an existing game's price and capacity.
    ///
    /// Silent no-op when the game is absent; callers editing via a form
    /// should check existence first. The engine never calls this when
    /// auto-creating; that always goes through `register`.
    ///
    /// ## Returns
    /// `true` if an entry was updated.
    pub fn update(&mut self, game_number: &str, ticket_price_cents: i64, total_tickets_per_book: i64) -> bool {
        match self.games.get_mut(game_number) {
            Some(game) => {
                game.ticket_price_cents = ticket_price_cents;
                game.total_tickets_per_book = total_tickets_per_book;
                true
            }
            None => false,
        }
    }

    /// Looks up a game by number.
    pub fn lookup(&self, game_number: &str) -> Option<&GameInfo> {
        self.games.get(game_number)
    }

    /// Removes a game from the registry.
    ///
    /// Does not touch any box: a box pointing at a deleted game keeps its
    /// last-known price and capacity until reconfigured (no-cascade).
    pub fn remove(&mut self, game_number: &str) -> Option<GameInfo> {
        self.games.remove(game_number)
    }

    /// All known games, ordered by game number.
    pub fn games(&self) -> impl Iterator<Item = &GameInfo> {
        self.games.values()
    }

    /// Number of known games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// True if no games are known yet.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn game(number: &str, price_cents: i64, per_book: i64) -> GameInfo {
        GameInfo {
            game_number: number.to_string(),
            ticket_price_cents: price_cents,
            total_tickets_per_book: per_book,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = GameRegistry::new();
        assert!(registry.register(game("746", 500, 60)));

        let found = registry.lookup("746").unwrap();
        assert_eq!(found.ticket_price_cents, 500);
        assert_eq!(found.total_tickets_per_book, 60);

        assert!(registry.lookup("999").is_none());
    }

    #[test]
    fn test_register_never_overwrites() {
        let mut registry = GameRegistry::new();
        registry.register(game("746", 500, 60));

        // Second registration with different values is a no-op.
        assert!(!registry.register(game("746", 1000, 30)));
        assert_eq!(registry.lookup("746").unwrap().ticket_price_cents, 500);
    }

    #[test]
    fn test_update_existing_only() {
        let mut registry = GameRegistry::new();
        registry.register(game("746", 500, 60));

        assert!(registry.update("746", 1000, 50));
        let updated = registry.lookup("746").unwrap();
        assert_eq!(updated.ticket_price_cents, 1000);
        assert_eq!(updated.total_tickets_per_book, 50);

        // Absent game: silent no-op.
        assert!(!registry.update("999", 100, 10));
        assert!(registry.lookup("999").is_none());
    }

    #[test]
    fn test_remove() {
        let mut registry = GameRegistry::new();
        registry.register(game("746", 500, 60));

        let removed = registry.remove("746").unwrap();
        assert_eq!(removed.game_number, "746");
        assert!(registry.is_empty());
        assert!(registry.remove("746").is_none());
    }

    #[test]
    fn test_games_ordered_by_number() {
        let mut registry = GameRegistry::from_games(vec![
            game("746", 500, 60),
            game("102", 100, 200),
            game("330", 300, 100),
        ]);
        registry.register(game("201", 200, 150));

        let numbers: Vec<&str> = registry.games().map(|g| g.game_number.as_str()).collect();
        assert_eq!(numbers, vec!["102", "201", "330", "746"]);
        assert_eq!(registry.len(), 4);
    }
}
