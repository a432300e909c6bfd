//! Session configuration
//!
//! [`SessionConfig`] gathers every tunable of a session: simulated latencies,
//! the repayment policy, whether tier deposit bounds are enforced, and the
//! validity date given to newly minted cards.

use crate::core::simulator::Operation;
use chrono::NaiveDate;
use clap::ValueEnum;
use std::time::Duration;

/// Simulated round-trip time of each store operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatencyConfig {
    pub fetch_cards: Duration,
    pub mint: Duration,
    pub spend: Duration,
    pub repay: Duration,
    pub fetch_transactions: Duration,
    pub fetch_credit: Duration,
    pub fetch_rewards: Duration,
    pub redeem: Duration,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            fetch_cards: Duration::from_millis(1000),
            mint: Duration::from_millis(2000),
            spend: Duration::from_millis(1500),
            repay: Duration::from_millis(1500),
            fetch_transactions: Duration::from_millis(800),
            fetch_credit: Duration::from_millis(1000),
            fetch_rewards: Duration::from_millis(1000),
            redeem: Duration::from_millis(2000),
        }
    }
}

impl LatencyConfig {
    /// No simulated delay at all
    pub fn instant() -> Self {
        Self {
            fetch_cards: Duration::ZERO,
            mint: Duration::ZERO,
            spend: Duration::ZERO,
            repay: Duration::ZERO,
            fetch_transactions: Duration::ZERO,
            fetch_credit: Duration::ZERO,
            fetch_rewards: Duration::ZERO,
            redeem: Duration::ZERO,
        }
    }

    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::FetchCards => self.fetch_cards,
            Operation::Mint => self.mint,
            Operation::Spend => self.spend,
            Operation::Repay => self.repay,
            Operation::FetchTransactions => self.fetch_transactions,
            Operation::FetchCredit => self.fetch_credit,
            Operation::FetchRewards => self.fetch_rewards,
            Operation::Redeem => self.redeem,
        }
    }
}

/// What a repayment larger than the outstanding amount does
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RepaymentPolicy {
    /// Reject the repayment; the card is untouched
    #[default]
    RejectExcess,
    /// Apply only what is outstanding, capping the balance at the spending limit
    ClampToLimit,
    /// Apply the full amount even past the spending limit
    Uncapped,
}

/// Configuration for one session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub latency: LatencyConfig,
    pub repayment_policy: RepaymentPolicy,
    /// Reject mints whose deposit falls outside the tier's range
    pub enforce_tier_bounds: bool,
    /// Validity date stamped on every newly minted card
    pub mint_validity: NaiveDate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            latency: LatencyConfig::default(),
            repayment_policy: RepaymentPolicy::default(),
            enforce_tier_bounds: true,
            mint_validity: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl SessionConfig {
    /// Default configuration without simulated delays
    pub fn instant() -> Self {
        Self {
            latency: LatencyConfig::instant(),
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: LatencyConfig) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_repayment_policy(mut self, policy: RepaymentPolicy) -> Self {
        self.repayment_policy = policy;
        self
    }

    pub fn with_tier_bounds(mut self, enforce: bool) -> Self {
        self.enforce_tier_bounds = enforce;
        self
    }
}
