//! # Money
//!
//! Integer-cents amounts for prices, line subtotals, and sale totals.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Where an amount comes from                                             │
//! │                                                                         │
//! │  products.price_cents ──(read under lock)──► SaleLine.unit_price        │
//! │                                                     │                   │
//! │                                      × quantity     ▼                   │
//! │                                             SaleLine.subtotal           │
//! │                                                     │                   │
//! │                                      Σ per sale     ▼                   │
//! │                                               Sale.total                │
//! │                                                                         │
//! │  Every step is integer arithmetic, so a total always equals the sum   │
//! │  of the subtotals printed next to it.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let coffee = Money::from_cents(1599);
//! let line = coffee.multiply_quantity(3);
//! assert_eq!(line.to_string(), "47.97");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

/// An amount in cents. Serialises as a bare integer (newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Price of `quantity` units. Panics on overflow in debug builds; the
    /// ledger uses [`Money::checked_multiply_quantity`] instead.
    #[inline]
    pub const fn multiply_quantity(&self, quantity: i64) -> Self {
        Money(self.0 * quantity)
    }

    /// Price of `quantity` units, `None` if it does not fit in an `i64`.
    #[inline]
    pub fn checked_multiply_quantity(&self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// `12.34`, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, quantity: i64) -> Self {
        self.multiply_quantity(quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
