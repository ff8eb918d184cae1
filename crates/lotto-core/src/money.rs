//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A day of scratch-off sales is hundreds of small additions:            │
//! │    30 × $1 tickets + 12 × $5 tickets + ... accumulated as floats       │
//! │    drifts by fractions of a cent and the till no longer balances.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every ticket price and sold amount is an i64 number of cents.       │
//! │    Addition and quantity multiplication are exact.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lotto_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(500); // $5.00 ticket
//!
//! // Five tickets sold since the last scan
//! let amount = price.multiply_quantity(5); // $25.00
//! assert_eq!(amount.cents(), 2500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// GameInfo.ticket_price_cents ──► per-scan amount (sold × price)
///                                       │
///                                       ▼
/// TicketBox.total_amount_sold_cents ──► daily summary totals
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use lotto_core::money::Money;
    ///
    /// let price = Money::from_cents(500); // Represents $5.00
    /// assert_eq!(price.cents(), 500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use lotto_core::money::Money;
    ///
    /// let ticket_price = Money::from_cents(500); // $5.00 per ticket
    /// let amount = ticket_price.multiply_quantity(5);
    /// assert_eq!(amount.cents(), 2500); // $25.00
    /// ```
    ///
    /// ## Scan Workflow
    /// ```text
    /// Reference ticket #60, scanned ticket #55
    ///      │
    ///      ▼
    /// tickets sold = 5
    ///      │
    ///      ▼
    /// multiply_quantity(5) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Amount sold: $25.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// Used in scan feedback messages ("Sold 5 tickets for $25.00").
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=, for running daily totals).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(2500)), "$25.00");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);

        let mut total = Money::zero();
        total += Money::from_cents(2500);
        total += Money::from_cents(100);
        assert_eq!(total.cents(), 2600);
    }

    #[test]
    fn test_multiply_quantity() {
        let ticket_price = Money::from_cents(500);
        let amount = ticket_price.multiply_quantity(5);
        assert_eq!(amount.cents(), 2500);

        // Zero tickets sold (re-scan of the reference position)
        assert_eq!(ticket_price.multiply_quantity(0).cents(), 0);
    }
}
