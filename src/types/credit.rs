//! Credit-profile types
//!
//! The session keeps one [`CreditProfile`] per connected wallet. Its score is a
//! running counter nudged by card events, always clamped to 300..=850.

use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credit score clamped to [`CreditScore::MIN`]..=[`CreditScore::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditScore(u16);

impl CreditScore {
    pub const MIN: u16 = 300;
    pub const MAX: u16 = 850;

    /// Build a score, clamping out-of-range values
    pub fn new(value: u16) -> Self {
        CreditScore(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// Score after a signed adjustment, clamped to the valid range
    pub fn adjusted(self, delta: i16) -> Self {
        let raw = i32::from(self.0) + i32::from(delta);
        let clamped = raw.clamp(i32::from(Self::MIN), i32::from(Self::MAX));
        CreditScore(clamped as u16)
    }

    pub fn band(self) -> ScoreBand {
        match self.0 {
            750..=u16::MAX => ScoreBand::Excellent,
            650..=749 => ScoreBand::Good,
            550..=649 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rating label for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Card event that moves the score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent {
    /// A completed purchase
    Spend { amount: Money },
    /// A completed repayment, on time or late
    Repayment { on_time: bool },
}

impl ScoreEvent {
    /// +1 for a spend, +2 for an on-time repayment, -1 for a late one
    pub fn delta(self) -> i16 {
        match self {
            ScoreEvent::Spend { .. } => 1,
            ScoreEvent::Repayment { on_time: true } => 2,
            ScoreEvent::Repayment { on_time: false } => -1,
        }
    }
}

/// Outcome of one score update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreChange {
    pub previous: CreditScore,
    pub current: CreditScore,
    /// Delta requested by the event; may exceed the applied change at the bounds
    pub delta: i16,
}

/// Monthly score sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    /// `YYYY-MM`
    pub label: String,
    pub score: CreditScore,
}

/// Percentage scores of the named score factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub repayment_history: u8,
    pub transaction_volume: u8,
    pub merchant_diversity: u8,
    pub account_age: u8,
}

/// Credit aggregate for the connected wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditProfile {
    pub score: CreditScore,
    pub total_transactions: u32,
    pub on_time_payments: u32,
    pub late_payments: u32,
    pub defaults: u32,
    pub total_spent: Money,
    /// Average days between a spend and its repayment
    pub avg_repayment_days: u32,
    pub last_updated: DateTime<Utc>,
    /// Oldest first
    pub score_history: Vec<ScorePoint>,
    pub factor_breakdown: FactorBreakdown,
}

impl CreditProfile {
    /// Share of repayments made on time, in percent
    pub fn on_time_ratio(&self) -> u8 {
        let repayments = self.on_time_payments + self.late_payments;
        if repayments == 0 {
            return 100;
        }
        ((u64::from(self.on_time_payments) * 100) / u64::from(repayments)) as u8
    }
}
