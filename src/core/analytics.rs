//! Derived views over cards and transactions
//!
//! Pure functions: nothing here touches a store.

use crate::types::{Card, Money, TransactionKind, TransactionRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Utilization at or above this percentage is rated [`UtilizationRating::High`]
pub const HEALTHY_UTILIZATION_PERCENT: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilizationRating {
    Healthy,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utilization {
    pub total_outstanding: Money,
    pub total_credit: Money,
    /// Outstanding as a percentage of credit, one decimal place
    pub percentage: Decimal,
    pub rating: UtilizationRating,
}

/// Credit utilization across every card
pub fn utilization(cards: &[Card]) -> Utilization {
    let total_outstanding: Money = cards.iter().map(Card::outstanding).sum();
    let total_credit: Money = cards.iter().map(Card::credit_limit).sum();
    let percentage = total_outstanding.percentage_of(total_credit);
    let rating = if percentage < Decimal::from(HEALTHY_UTILIZATION_PERCENT) {
        UtilizationRating::Healthy
    } else {
        UtilizationRating::High
    };

    Utilization {
        total_outstanding,
        total_credit,
        percentage,
        rating,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    pub category: String,
    pub amount: Money,
    /// Share of all spending, one decimal place
    pub percentage: Decimal,
}

fn spends(transactions: &[TransactionRecord]) -> impl Iterator<Item = &TransactionRecord> {
    transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Spend)
}

/// Spending per category, largest first; ties break alphabetically
pub fn category_breakdown(transactions: &[TransactionRecord]) -> Vec<CategorySpend> {
    let mut totals: HashMap<&str, Money> = HashMap::new();
    for tx in spends(transactions) {
        let total = totals.entry(tx.category.as_str()).or_default();
        *total = total.checked_add(tx.amount).unwrap_or(*total);
    }

    let grand_total: Money = totals.values().copied().sum();
    let mut breakdown: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(category, amount)| CategorySpend {
            category: category.to_string(),
            amount,
            percentage: amount.percentage_of(grand_total),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantSpend {
    pub merchant: String,
    pub amount: Money,
    pub count: usize,
}

/// The `n` merchants with the highest spend, largest first
pub fn top_merchants(transactions: &[TransactionRecord], n: usize) -> Vec<MerchantSpend> {
    let mut totals: HashMap<&str, (Money, usize)> = HashMap::new();
    for tx in spends(transactions) {
        let Some(merchant) = tx.merchant.as_deref() else {
            continue;
        };
        let (amount, count) = totals.entry(merchant).or_default();
        *amount = amount.checked_add(tx.amount).unwrap_or(*amount);
        *count += 1;
    }

    let mut merchants: Vec<MerchantSpend> = totals
        .into_iter()
        .map(|(merchant, (amount, count))| MerchantSpend {
            merchant: merchant.to_string(),
            amount,
            count,
        })
        .collect();

    merchants.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    merchants.truncate(n);
    merchants
}
