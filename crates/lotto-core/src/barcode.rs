//! # Barcode Parsing
//!
//! Decodes raw scanned (or typed) barcode strings into game, book and
//! ticket numbers according to the active jurisdiction's format.
//!
//! ## Supported Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MARYLAND (fixed 20-digit numeric)                                      │
//! │                                                                         │
//! │   7 4 6 0 4 7 5 5 1 0 5 5 0 0 0 0 0 0 0 0                              │
//! │   └─────┘ └─────────┘ └───┘                                            │
//! │    game      book     ticket    (remaining digits are check/filler)    │
//! │    [0,3)     [3,9)    [9,12)                                           │
//! │                                                                         │
//! │  WASHINGTON DC (two accepted shapes)                                    │
//! │                                                                         │
//! │   a. Dashed:        1619-04147-7-017                                   │
//! │      game = "1619", book = normalize("04147") = "4147", ticket = 17    │
//! │                                                                         │
//! │   b. Long numeric:  161904147017xxxxxxxx   (>= 12 digits, no dashes)   │
//! │      game = [0,4), book = normalize([4,9)), ticket = [9,12)            │
//! │                                                                         │
//! │  Book numbers are normalized for DC only, so the same physical book    │
//! │  compares equal whichever shape the scanner produced. Maryland books   │
//! │  are always exactly 6 digits and never normalized.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing is a pure function: bad input yields `None`, and the engine maps
//! that to an `invalid_barcode` error with a jurisdiction-specific hint.

use serde::{Deserialize, Serialize};

use crate::types::StateCode;

// =============================================================================
// Decoded Barcode
// =============================================================================

/// The fields decoded from a ticket barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedBarcode {
    /// Game number (e.g. "746").
    pub game_number: String,

    /// Book number, normalized where the jurisdiction requires it.
    pub book_number: String,

    /// Ticket number within the book.
    pub ticket_number: i64,
}

// =============================================================================
// Jurisdiction Dispatch
// =============================================================================

impl StateCode {
    /// Decodes a raw barcode string for this jurisdiction.
    ///
    /// ## Returns
    /// * `Some(DecodedBarcode)` - input matched the jurisdiction's format
    /// * `None` - unparseable; caller surfaces `invalid_barcode`
    ///
    /// ## Example
    /// ```rust
    /// use lotto_core::types::StateCode;
    ///
    /// let decoded = StateCode::Md
    ///     .parse_barcode("74604755105500000000")
    ///     .unwrap();
    /// assert_eq!(decoded.game_number, "746");
    /// assert_eq!(decoded.book_number, "047551");
    /// assert_eq!(decoded.ticket_number, 55);
    /// ```
    pub fn parse_barcode(&self, raw: &str) -> Option<DecodedBarcode> {
        match self {
            StateCode::Md => parse_fixed_20(raw),
            StateCode::Dc => parse_dashed_or_long(raw),
        }
    }

    /// Operator-facing hint describing the expected input shape.
    ///
    /// Shown alongside `invalid_barcode` errors so the clerk knows what the
    /// scanner should have produced.
    pub const fn barcode_hint(&self) -> &'static str {
        match self {
            StateCode::Md => "Expected 20 digits.",
            StateCode::Dc => "Expected a dashed code like 1619-04147-7-017 or at least 12 digits.",
        }
    }
}

// =============================================================================
// Format Parsers
// =============================================================================

/// Maryland: input must be exactly 20 ASCII digits.
fn parse_fixed_20(raw: &str) -> Option<DecodedBarcode> {
    if raw.len() != 20 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // All-ASCII verified above, so byte slicing is safe.
    let ticket_number = raw[9..12].parse::<i64>().ok()?;

    Some(DecodedBarcode {
        game_number: raw[0..3].to_string(),
        book_number: raw[3..9].to_string(),
        ticket_number,
    })
}

/// Washington DC: dashed segments, or a long run of digits.
fn parse_dashed_or_long(raw: &str) -> Option<DecodedBarcode> {
    if raw.contains('-') {
        let segments: Vec<&str> = raw.split('-').collect();
        if segments.len() < 3 {
            return None;
        }

        // The ticket number is always the last segment.
        let ticket_number = segments[segments.len() - 1].parse::<i64>().ok()?;

        return Some(DecodedBarcode {
            game_number: segments[0].to_string(),
            book_number: normalize_book_number(segments[1]),
            ticket_number,
        });
    }

    if raw.len() >= 12 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let ticket_number = raw[9..12].parse::<i64>().ok()?;

        return Some(DecodedBarcode {
            game_number: raw[0..4].to_string(),
            book_number: normalize_book_number(&raw[4..9]),
            ticket_number,
        });
    }

    None
}

/// Strips leading zeros from a book number, keeping at least one digit.
///
/// Required so the dashed and long-numeric DC shapes produce comparable
/// book numbers for the same physical book ("04147" == "4147").
///
/// ## Example
/// ```rust
/// use lotto_core::barcode::normalize_book_number;
///
/// assert_eq!(normalize_book_number("04147"), "4147");
/// assert_eq!(normalize_book_number("00"), "0");
/// ```
pub fn normalize_book_number(book: &str) -> String {
    let stripped = book.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maryland_decomposes_at_fixed_offsets() {
        let decoded = StateCode::Md
            .parse_barcode("74604755105500000000")
            .unwrap();
        assert_eq!(decoded.game_number, "746");
        assert_eq!(decoded.book_number, "047551");
        assert_eq!(decoded.ticket_number, 55);
    }

    #[test]
    fn test_maryland_book_is_never_normalized() {
        let decoded = StateCode::Md
            .parse_barcode("74600755100000000000")
            .unwrap();
        // Leading zero preserved: MD books are always exactly 6 digits.
        assert_eq!(decoded.book_number, "007551");
    }

    #[test]
    fn test_maryland_rejects_wrong_length() {
        assert!(StateCode::Md.parse_barcode("").is_none());
        assert!(StateCode::Md.parse_barcode("746047551055").is_none());
        assert!(StateCode::Md
            .parse_barcode("746047551055000000001") // 21 digits
            .is_none());
    }

    #[test]
    fn test_maryland_rejects_non_numeric() {
        assert!(StateCode::Md.parse_barcode("7460475510550000000X").is_none());
        assert!(StateCode::Md.parse_barcode("1619-04147-7-0170000").is_none());
    }

    #[test]
    fn test_dc_dashed() {
        let decoded = StateCode::Dc.parse_barcode("1619-04147-7-017").unwrap();
        assert_eq!(decoded.game_number, "1619");
        assert_eq!(decoded.book_number, "4147");
        assert_eq!(decoded.ticket_number, 17);
    }

    #[test]
    fn test_dc_dashed_requires_three_segments() {
        assert!(StateCode::Dc.parse_barcode("1619-04147").is_none());
        assert!(StateCode::Dc.parse_barcode("1619").is_none());
    }

    #[test]
    fn test_dc_dashed_rejects_non_numeric_ticket() {
        assert!(StateCode::Dc.parse_barcode("1619-04147-7-0X7").is_none());
        assert!(StateCode::Dc.parse_barcode("1619-04147-7-").is_none());
    }

    #[test]
    fn test_dc_long_numeric() {
        let decoded = StateCode::Dc.parse_barcode("161904147017").unwrap();
        assert_eq!(decoded.game_number, "1619");
        assert_eq!(decoded.book_number, "4147");
        assert_eq!(decoded.ticket_number, 17);
    }

    #[test]
    fn test_dc_both_shapes_agree_on_the_same_book() {
        let dashed = StateCode::Dc.parse_barcode("1619-04147-7-017").unwrap();
        let long = StateCode::Dc.parse_barcode("16190414701700000000").unwrap();
        assert_eq!(dashed.game_number, long.game_number);
        assert_eq!(dashed.book_number, long.book_number);
        assert_eq!(dashed.ticket_number, long.ticket_number);
    }

    #[test]
    fn test_dc_rejects_short_numeric() {
        assert!(StateCode::Dc.parse_barcode("16190414701").is_none()); // 11 digits
        assert!(StateCode::Dc.parse_barcode("abc904147017").is_none());
    }

    #[test]
    fn test_normalize_strips_leading_zeros() {
        assert_eq!(normalize_book_number("00123"), "123");
        assert_eq!(normalize_book_number("04147"), "4147");
        assert_eq!(normalize_book_number("4147"), "4147");
    }

    #[test]
    fn test_normalize_keeps_at_least_one_digit() {
        assert_eq!(normalize_book_number("00"), "0");
        assert_eq!(normalize_book_number("0"), "0");
        assert_eq!(normalize_book_number(""), "0");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["00123", "0", "00", "4147", "000000"] {
            let once = normalize_book_number(input);
            assert_eq!(normalize_book_number(&once), once);
        }
    }
}
