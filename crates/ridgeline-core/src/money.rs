//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    A 50.00 € daily rate is 5000 cents, and 5000 × 2 is exact.       │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invoice amounts in this system are VAT-inclusive; [`Money::excl_tax`] and
//! [`Money::tax_part`] derive the breakdown shown on the exported invoice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so 2000 bps = 20% (standard French VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (euro cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and corrections
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for serialization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use ridgeline_core::money::Money;
    ///
    /// let rate = Money::from_cents(5000); // 50.00 €
    /// assert_eq!(rate.cents(), 5000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (euros and cents).
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50 €, not -4.50 €.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the amount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the amount is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Splits a VAT-inclusive amount and returns the ex-tax part.
    ///
    /// The stored invoice amount already contains VAT, so the exported
    /// subtotal is `total × 10000 / (10000 + bps)`, rounded half-up, the
    /// integer equivalent of the historical `round(total / 1.2)` at 20%.
    ///
    /// ## Example
    /// ```rust
    /// use ridgeline_core::money::{Money, TaxRate};
    ///
    /// let total = Money::from_cents(10000); // 100.00 € incl. VAT
    /// let vat = TaxRate::from_bps(2000);    // 20%
    /// assert_eq!(total.excl_tax(vat).cents(), 8333); // 83.33 €
    /// ```
    pub fn excl_tax(self, rate: TaxRate) -> Money {
        if rate.is_zero() {
            return self;
        }
        let divisor = 10_000 + rate.bps() as i64;
        let scaled = self.0 * 10_000;
        // round half-up, careful with negative totals
        let rounded = if scaled >= 0 {
            (scaled + divisor / 2) / divisor
        } else {
            (scaled - divisor / 2) / divisor
        };
        Money(rounded)
    }

    /// Returns the VAT part of a VAT-inclusive amount.
    ///
    /// Always `self - excl_tax(rate)`, so subtotal + tax reconstructs the
    /// stored total exactly.
    pub fn tax_part(self, rate: TaxRate) -> Money {
        self - self.excl_tax(rate)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

impl fmt::Display for Money {
    /// Formats as a euro amount, e.g. `50.00 €` or `-5.50 €`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02} €", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
