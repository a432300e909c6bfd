//! Reward-subsystem types
//!
//! Rewards are counted in CT tokens. Cashback earns one token per ₹10 and the
//! redemption catalog trades tokens for vouchers, crypto or wallet cashback.

use super::money::Money;
use super::transaction::TransactionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loyalty level shown next to the token balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Token balance and cumulative reward figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBalance {
    pub ct_tokens: u64,
    pub cashback_earned: Money,
    pub total_redeemed: Money,
    pub loyalty_tier: LoyaltyTier,
    /// Percent progress towards the next loyalty tier
    pub next_tier_progress: u8,
}

/// One cashback credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashbackEntry {
    pub id: String,
    pub amount: Money,
    pub source: String,
    pub date: DateTime<Utc>,
    /// Transaction that earned the cashback
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionKind {
    Crypto,
    Voucher,
    Cashback,
}

/// Catalog entry that tokens can be exchanged for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionOption {
    pub id: String,
    pub kind: RedemptionKind,
    pub title: String,
    pub description: String,
    /// Price in CT tokens
    pub cost_in_ct: u64,
    /// What the holder receives, in rupees
    pub value: Money,
    pub available: bool,
}

/// Everything the rewards page loads at once
#[derive(Debug, Clone, PartialEq)]
pub struct RewardsSnapshot {
    pub balance: RewardBalance,
    /// Newest first
    pub cashback_history: Vec<CashbackEntry>,
    pub redemption_options: Vec<RedemptionOption>,
}

/// Static referral programme summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralSummary {
    pub referral_count: u32,
    pub total_earned: Money,
    pub pending_rewards: Money,
}

/// Result of a successful redemption
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionReceipt {
    pub redemption_id: String,
    pub option_id: String,
    pub tokens_spent: u64,
    pub tokens_remaining: u64,
}
