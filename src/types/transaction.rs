//! Transaction-related types for the spend-card engine
//!
//! Transactions are immutable records of card events. The session log only ever
//! prepends them; the filter and search types here describe read-only views.

use super::card::CardId;
use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier, e.g. `tx_001` or `tx_1705329000000`
pub type TransactionId = String;

/// Kinds of card event recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Purchase made with the card; lowers the remaining balance
    Spend,
    /// Money paid back; raises the remaining balance
    Repayment,
    /// Deposit locked to mint a new card
    Mint,
    /// Reward credited for an earlier purchase
    Cashback,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Spend => "spend",
            TransactionKind::Repayment => "repayment",
            TransactionKind::Mint => "mint",
            TransactionKind::Cashback => "cashback",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

/// A recorded transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub card_id: CardId,
    pub card_name: String,
    pub kind: TransactionKind,
    /// Unsigned magnitude; see [`TransactionRecord::signed_amount`]
    pub amount: Money,
    pub merchant: Option<String>,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub description: String,
}

impl TransactionRecord {
    /// Amount from the card holder's side: spends are negative
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Spend => -self.amount,
            TransactionKind::Repayment | TransactionKind::Mint | TransactionKind::Cashback => {
                self.amount
            }
        }
    }

    /// Case-insensitive substring match over description, merchant and category
    ///
    /// `needle` must already be lowercase.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.description.to_lowercase().contains(needle)
            || self
                .merchant
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(needle))
            || self.category.to_lowercase().contains(needle)
    }
}

/// Fields supplied by the caller when appending; the log fills in id, time and status
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub card_id: CardId,
    pub card_name: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub merchant: Option<String>,
    pub category: String,
    pub description: String,
}

/// Inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Equality filter over the log; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub date_range: Option<DateRange>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &TransactionRecord) -> bool {
        if self.kind.is_some_and(|kind| kind != tx.kind) {
            return false;
        }
        if self
            .category
            .as_deref()
            .is_some_and(|category| category != tx.category)
        {
            return false;
        }
        // A merchant filter never matches transactions without a merchant
        if let Some(merchant) = self.merchant.as_deref() {
            if tx.merchant.as_deref() != Some(merchant) {
                return false;
            }
        }
        if let Some(range) = self.date_range {
            if !range.contains(tx.timestamp) {
                return false;
            }
        }
        true
    }
}
