//! # Validation Module
//!
//! Input validation for box and book configuration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / command layer)                                  │
//! │  ├── Basic format checks (empty, numeric keypad)                       │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Box number within rack limits                                     │
//! │  ├── Positive price and book capacity                                  │
//! │  └── Numeric game numbers                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE constraints on natural keys                                │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_BOXES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a box number.
///
/// ## Rules
/// - Must be between 1 and MAX_BOXES (70)
pub fn validate_box_number(box_number: u32) -> ValidationResult<()> {
    if box_number == 0 || box_number > MAX_BOXES {
        return Err(ValidationError::OutOfRange {
            field: "box number".to_string(),
            min: 1,
            max: MAX_BOXES as i64,
        });
    }

    Ok(())
}

/// Validates a ticket price in cents.
///
/// ## Rules
/// - Must be positive (> 0); a configured box always has a real price
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "ticket price".to_string(),
        });
    }

    Ok(())
}

/// Validates a book's printed ticket capacity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_tickets_per_book(count: i64) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "tickets per book".to_string(),
        });
    }

    Ok(())
}

/// Validates a starting ticket number.
///
/// ## Rules
/// - Must be non-negative; ascending books legitimately start at 0 or 1
pub fn validate_starting_ticket(number: i64) -> ValidationResult<()> {
    if number < 0 {
        return Err(ValidationError::OutOfRange {
            field: "starting ticket number".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a game number.
///
/// ## Rules
/// - Must not be empty
/// - Must be all digits (game numbers are printed numerics like "746")
/// - Maximum 10 characters
pub fn validate_game_number(game_number: &str) -> ValidationResult<()> {
    let game_number = game_number.trim();

    if game_number.is_empty() {
        return Err(ValidationError::Required {
            field: "game number".to_string(),
        });
    }

    if game_number.len() > 10 {
        return Err(ValidationError::OutOfRange {
            field: "game number length".to_string(),
            min: 1,
            max: 10,
        });
    }

    if !game_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "game number".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Parses a manual ticket-number entry.
///
/// Manual entry accepts a bare non-negative integer string; anything else
/// is treated as an invalid barcode by the engine.
///
/// ## Example
/// ```rust
/// use lotto_core::validation::parse_manual_ticket;
///
/// assert_eq!(parse_manual_ticket("55"), Some(55));
/// assert_eq!(parse_manual_ticket(" 017 "), Some(17));
/// assert_eq!(parse_manual_ticket("-5"), None);
/// assert_eq!(parse_manual_ticket("5.5"), None);
/// ```
pub fn parse_manual_ticket(input: &str) -> Option<i64> {
    let input = input.trim();

    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    input.parse::<i64>().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_box_number() {
        assert!(validate_box_number(1).is_ok());
        assert!(validate_box_number(70).is_ok());

        assert!(validate_box_number(0).is_err());
        assert!(validate_box_number(71).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(100).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-500).is_err());
    }

    #[test]
    fn test_validate_tickets_per_book() {
        assert!(validate_tickets_per_book(60).is_ok());
        assert!(validate_tickets_per_book(0).is_err());
    }

    #[test]
    fn test_validate_starting_ticket() {
        assert!(validate_starting_ticket(0).is_ok());
        assert!(validate_starting_ticket(60).is_ok());
        assert!(validate_starting_ticket(-1).is_err());
    }

    #[test]
    fn test_validate_game_number() {
        assert!(validate_game_number("746").is_ok());
        assert!(validate_game_number("1619").is_ok());

        assert!(validate_game_number("").is_err());
        assert!(validate_game_number("   ").is_err());
        assert!(validate_game_number("74A").is_err());
        assert!(validate_game_number("12345678901").is_err());
    }

    #[test]
    fn test_parse_manual_ticket() {
        assert_eq!(parse_manual_ticket("0"), Some(0));
        assert_eq!(parse_manual_ticket("55"), Some(55));
        assert_eq!(parse_manual_ticket("017"), Some(17));

        assert_eq!(parse_manual_ticket(""), None);
        assert_eq!(parse_manual_ticket("-1"), None);
        assert_eq!(parse_manual_ticket("12a"), None);
        assert_eq!(parse_manual_ticket("1 2"), None);
    }
}
