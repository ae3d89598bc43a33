//! Money module - fixed-point monetary amounts in minor units

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// A monetary amount in the local currency's smallest unit (centavos).
///
/// Stored as a signed 64-bit integer so arithmetic never accumulates
/// binary-float rounding drift. Serializes as a bare integer, which is
/// also the wire representation on the HTTP boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(0);

    /// Create a Money from an amount in minor units (centavos)
    ///
    /// # Examples
    ///
    /// ```
    /// use fisiopay_domain::Money;
    ///
    /// let m = Money::from_cents(123456);
    /// assert_eq!(m.to_string(), "1.234,56");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Get the raw minor-unit value
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Absolute magnitude (deduction components are stored non-negative)
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Whether this amount is exactly zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    /// Brazilian format: thousands separated by `.`, decimals by `,`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let int_part = abs / 100;
        let frac_part = abs % 100;

        let digits = int_part.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{}{},{:02}", sign, grouped, frac_part)
    }
}
