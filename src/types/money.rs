//! Monetary amounts for the spend-card engine
//!
//! Every balance, limit and transaction amount is a [`Money`] value: rupees held
//! as a `Decimal` rounded to two fractional digits (paise). Amounts are only ever
//! turned into text through the `Display` impl, which renders Indian digit
//! grouping (`₹2,45,600`). Display strings are never parsed back into amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits kept for every amount
pub const MONEY_SCALE: u32 = 2;

/// Rupee amount with paise precision
///
/// Signed: transaction views use negative values for outflows. Store operations
/// validate positivity themselves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero rupees
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal amount, rounding half away from zero to paise
    pub fn new(amount: Decimal) -> Self {
        Money(amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Whole-rupee amount
    pub fn rupees(rupees: i64) -> Self {
        Money(Decimal::new(rupees, 0))
    }

    /// Amount expressed in paise (1/100 rupee)
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, MONEY_SCALE))
    }

    /// The underlying decimal value
    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Strictly greater than zero
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money::new)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money::new)
    }

    /// Multiply by a plain factor (deposit multipliers, plan fractions)
    pub fn checked_mul(self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(factor).map(Money::new)
    }

    /// Subtract, flooring the result at zero
    pub fn saturating_sub(self, other: Money) -> Money {
        match self.checked_sub(other) {
            Some(result) if !result.is_negative() => result,
            _ => Money::ZERO,
        }
    }

    /// `self` as a percentage of `whole`, rounded to one decimal place
    ///
    /// Returns zero when `whole` is zero.
    pub fn percentage_of(self, whole: Money) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        (self.0 * Decimal::ONE_HUNDRED / whole.0).round_dp(1)
    }

    /// Number of whole `unit`s contained in this amount (floor division)
    ///
    /// Negative amounts and a zero unit yield zero.
    pub fn whole_units_of(self, unit: Decimal) -> u64 {
        if unit <= Decimal::ZERO || self.is_negative() {
            return 0;
        }
        (self.0 / unit).floor().to_u64().unwrap_or(0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money::new(iter.map(|m| m.0).sum())
    }
}

/// Group the integer part the Indian way: last three digits, then pairs
fn group_indian(value: u128) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs();
        let rupees = abs.trunc().to_u128().unwrap_or(0);
        let paise = (abs.fract() * Decimal::ONE_HUNDRED)
            .trunc()
            .to_u32()
            .unwrap_or(0);

        if paise == 0 {
            write!(f, "{}₹{}", sign, group_indian(rupees))
        } else {
            write!(f, "{}₹{}.{:02}", sign, group_indian(rupees), paise)
        }
    }
}
