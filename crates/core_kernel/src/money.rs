//! Money type with exact decimal arithmetic
//!
//! Reimbursements are single-currency, so `Money` is a thin wrapper around
//! `rust_decimal::Decimal` fixed at two decimal places. Amounts entered by
//! users are validated to carry at most two decimals, which keeps every
//! product and sum exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use thiserror::Error;

/// Number of decimal places every amount is rendered with
pub const CURRENCY_SCALE: u32 = 2;

/// Errors that can occur while constructing money values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must be positive, got {0}")]
    NotPositive(Decimal),

    #[error("Amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount with two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value, quantized to two decimal places
    pub fn new(amount: Decimal) -> Self {
        let mut amount = amount.round_dp(CURRENCY_SCALE);
        amount.rescale(CURRENCY_SCALE);
        Self(amount)
    }

    /// Creates a price: strictly positive with at most two decimals
    ///
    /// Unlike [`Money::new`] this never rounds; an over-precise input is an
    /// error so that `quantity * price` stays exact.
    pub fn price(amount: Decimal) -> Result<Self, MoneyError> {
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive(amount));
        }
        if amount.normalize().scale() > CURRENCY_SCALE {
            return Err(MoneyError::TooPrecise(amount));
        }
        Ok(Self::new(amount))
    }

    /// Creates Money from an integer amount in minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self::new(Decimal::new(minor_units, CURRENCY_SCALE))
    }

    /// Zero
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiplies by a whole quantity, failing on overflow
    pub fn checked_times(&self, quantity: u32) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Lossy conversion for output formats that only know floats
    pub fn to_f64(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}
