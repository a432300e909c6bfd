//! Types module
//!
//! Contains core data structures used throughout the engine.
//! This module organizes types into logical submodules:
//! - `money`: the single monetary type and its display boundary
//! - `card`: cards, tiers and repayment plans
//! - `transaction`: transaction records, filters and identifiers
//! - `credit`: credit score and profile
//! - `rewards`: CT token balance, cashback and redemption catalog
//! - `wallet`: observed wallet connection status
//! - `error`: error types for the engine

pub mod card;
pub mod credit;
pub mod error;
pub mod money;
pub mod rewards;
pub mod transaction;
pub mod wallet;

pub use card::{Card, CardId, CardTier, MintQuote, RepaymentPlan, TierSpec};
pub use credit::{
    CreditProfile, CreditScore, FactorBreakdown, ScoreBand, ScoreChange, ScoreEvent, ScorePoint,
};
pub use error::LedgerError;
pub use money::Money;
pub use rewards::{
    CashbackEntry, LoyaltyTier, RedemptionKind, RedemptionOption, RedemptionReceipt,
    ReferralSummary, RewardBalance, RewardsSnapshot,
};
pub use transaction::{
    DateRange, NewTransaction, TransactionFilter, TransactionId, TransactionKind,
    TransactionRecord, TransactionStatus,
};
pub use wallet::WalletStatus;
