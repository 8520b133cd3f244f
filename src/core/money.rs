//! Fixed-point amount arithmetic.
//!
//! Every monetary value, quantity and percentage rate in the system has two decimal places.
//! `Amount` stores that value as integer hundredths so that nothing is ever held in a binary
//! float, and all multiplication goes through `rust_decimal` with half-away-from-zero rounding
//! back to two places.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::DeriveValueType;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

const DECIMAL_PLACES: u32 = 2;

/// A two-decimal fixed-point value stored as integer hundredths.
///
/// Used for money (`40.00`), quantities (`2.50` kg) and percentage rates (`16.00` %).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    DeriveValueType,
)]
#[serde(transparent)]
pub struct Amount(i64);

/// Largest difference tolerated between a submitted and a derived amount.
pub const MONEY_TOLERANCE: Amount = Amount(1);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Builds an amount from hundredths, e.g. `from_minor(4000)` is `40.00`.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Builds an amount from whole units, e.g. `from_units(40)` is `40.00`.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Rounds a decimal to two places (half away from zero) and stores it.
    ///
    /// Values outside the `i64` hundredths range saturate.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Self {
        Self::try_from_decimal(value).unwrap_or(if value.is_sign_negative() {
            Self(i64::MIN)
        } else {
            Self(i64::MAX)
        })
    }

    /// Rounds a decimal to two places, or `None` outside the `i64` hundredths range.
    #[must_use]
    pub fn try_from_decimal(value: Decimal) -> Option<Self> {
        let mut rounded =
            value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(DECIMAL_PLACES);
        i64::try_from(rounded.mantissa()).ok().map(Self)
    }

    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self × other`, rounded back to two places, or `None` on overflow.
    #[must_use]
    pub fn checked_times(self, other: Self) -> Option<Self> {
        self.to_decimal()
            .checked_mul(other.to_decimal())
            .and_then(Self::try_from_decimal)
    }

    /// `self × rate / 100`, rounded back to two places, or `None` on overflow.
    #[must_use]
    pub fn checked_percent(self, rate: Self) -> Option<Self> {
        self.to_decimal()
            .checked_mul(rate.to_decimal())
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .and_then(Self::try_from_decimal)
    }

    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Absolute difference between two amounts.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).saturating_abs())
    }
}

/// `max(0, x)`: balances are never negative.
#[must_use]
pub fn clamp_non_negative(value: Amount) -> Amount {
    value.max(Amount::ZERO)
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::from_decimal(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Decimal::from_str(s.trim())
            .map(Self::from_decimal)
            .map_err(|e| Error::validation("amount", format!("'{s}' is not a decimal number: {e}")))
    }
}
