//! Money type for representing monetary values.
//!
//! Uses cents-based integer representation to avoid floating-point
//! precision issues that plague monetary calculations. The storefront
//! trades in a single currency, so no currency tag is carried; on the wire
//! money is a plain decimal number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::coerce;

/// Number of minor units per major unit.
const MINOR_UNITS: i64 = 100;

/// A monetary value.
///
/// Amounts are stored in the smallest unit of the currency (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
}

impl Money {
    /// Create a new Money value from cents.
    pub const fn new(amount_cents: i64) -> Self {
        Self { amount_cents }
    }

    /// Create a Money value from a decimal amount.
    ///
    /// Non-finite input yields zero.
    ///
    /// ```
    /// use baggo_commerce::money::Money;
    /// let price = Money::from_decimal(49.99);
    /// assert_eq!(price.amount_cents, 4999);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Self::zero();
        }
        Self::new((amount * MINOR_UNITS as f64).round() as i64)
    }

    /// Create a zero amount.
    pub const fn zero() -> Self {
        Self::new(0)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        self.amount_cents as f64 / MINOR_UNITS as f64
    }

    /// Format as a display string (e.g., "49.99").
    pub fn display(&self) -> String {
        format!("{:.2}", self.to_decimal())
    }

    /// Saturating addition.
    pub fn saturating_add(&self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_add(other.amount_cents))
    }

    /// Saturating subtraction.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_sub(other.amount_cents))
    }

    /// Multiply by a quantity.
    pub fn multiply(&self, factor: i64) -> Money {
        Money::new(self.amount_cents.saturating_mul(factor))
    }

    /// Multiply by a decimal factor (e.g., for percentages).
    pub fn multiply_decimal(&self, factor: f64) -> Money {
        let new_amount = (self.amount_cents as f64 * factor).round();
        if new_amount.is_finite() {
            Money::new(new_amount as i64)
        } else {
            Money::zero()
        }
    }

    /// Calculate a percentage of this amount.
    pub fn percentage(&self, percent: f64) -> Money {
        self.multiply_decimal(percent / 100.0)
    }

    /// Clamp into `[lower, upper]`, applying the upper bound first.
    pub fn clamp_between(self, lower: Money, upper: Money) -> Money {
        self.min(upper).max(lower)
    }

    /// Sum an iterator of Money values.
    pub fn sum<'a>(iter: impl Iterator<Item = &'a Money>) -> Money {
        iter.fold(Money::zero(), |acc, m| acc.saturating_add(*m))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        self.saturating_add(other)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        self.saturating_sub(other)
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        self.multiply(factor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    /// Accepts any JSON value; non-numeric input becomes zero.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(coerce::to_money(Some(&value)))
    }
}
