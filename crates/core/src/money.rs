//! Monetary amounts in integer minor units.
//!
//! Prices and totals are stored as cents so that spend totals reconcile exactly
//! with the sum of their line totals.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

const CENTS_PER_UNIT: i64 = 100;

/// A monetary value in the smallest currency unit.
///
/// Signed so that a bad price can be represented and then rejected at the
/// aggregate boundary instead of being unrepresentable at construction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole currency units, e.g. `Money::from_units(1500)` is 1500.00.
    pub const fn from_units(units: i64) -> Self {
        Self(units * CENTS_PER_UNIT)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = CENTS_PER_UNIT.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses plain decimal notation: `1500`, `1500.5`, `-12.30`, `7500.0`.
    ///
    /// Digits past the second decimal place must be zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid_argument(format!("not a monetary amount: {s:?}"));

        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (kept, rest) = frac.split_at(frac.len().min(2));
        if rest.chars().any(|c| c != '0') {
            return Err(invalid());
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut cents: i64 = if kept.is_empty() {
            0
        } else {
            kept.parse().map_err(|_| invalid())?
        };
        if kept.len() == 1 {
            cents *= 10;
        }

        let total = units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_uses_two_decimal_places() {
        assert_eq!(Money::from_units(1500).to_string(), "1500.00");
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn parses_integer_and_decimal_forms() {
        assert_eq!("3000".parse::<Money>().unwrap(), Money::from_units(3000));
        assert_eq!("7500.0".parse::<Money>().unwrap(), Money::from_units(7500));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert_eq!("-12.30".parse::<Money>().unwrap(), Money::from_cents(-1230));
        assert_eq!(" 10.990 ".parse::<Money>().unwrap(), Money::from_cents(1099));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "abc", "1e3", "12.345", ".", "1,000", "--1"] {
            assert!(bad.parse::<Money>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn checked_mul_detects_overflow() {
        assert_eq!(
            Money::from_units(1500).checked_mul(2),
            Some(Money::from_units(3000))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: rendering then parsing is lossless.
        #[test]
        fn display_parses_back(cents in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_cents(cents);
            prop_assert_eq!(m.to_string().parse::<Money>().unwrap(), m);
        }
    }
}
