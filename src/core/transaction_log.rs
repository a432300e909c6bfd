//! Append-only transaction history
//!
//! The log is kept newest first. Appends always land at index 0 and nothing is
//! ever edited or removed, except by [`TransactionLog::reset`] when the wallet
//! changes.

use crate::core::context::StoreContext;
use crate::core::simulator::Operation;
use crate::types::{
    CardId, LedgerError, NewTransaction, TransactionFilter, TransactionRecord, TransactionStatus,
};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Debug)]
pub struct TransactionLog {
    ctx: StoreContext,
    /// Newest first
    entries: RwLock<VecDeque<TransactionRecord>>,
    hydrated: Mutex<bool>,
}

impl TransactionLog {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            entries: RwLock::new(VecDeque::new()),
            hydrated: Mutex::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<TransactionRecord>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<TransactionRecord>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn hydrate(&self, account: &str) {
        let mut hydrated = self.hydrated.lock().unwrap_or_else(PoisonError::into_inner);
        if *hydrated {
            return;
        }

        // Seed history is older than anything appended locally
        let mut entries = self.write();
        entries.extend(self.ctx.ledger.transactions(account));
        *hydrated = true;
    }

    pub fn reset(&self) {
        let mut hydrated = self.hydrated.lock().unwrap_or_else(PoisonError::into_inner);
        self.write().clear();
        *hydrated = false;
    }

    /// Load the history, optionally for a single card
    ///
    /// Empty without a connected wallet.
    pub async fn fetch(
        &self,
        card: Option<CardId>,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let Some(account) = self.ctx.active_account() else {
            return Ok(Vec::new());
        };

        self.ctx.simulator.call(Operation::FetchTransactions).await?;
        self.hydrate(&account);

        Ok(self
            .read()
            .iter()
            .filter(|tx| card.is_none_or(|id| tx.card_id == id))
            .cloned()
            .collect())
    }

    /// Record a completed transaction at the head of the log
    pub fn append(&self, new: NewTransaction) -> TransactionRecord {
        let record = TransactionRecord {
            id: self.ctx.next_id("tx"),
            card_id: new.card_id,
            card_name: new.card_name,
            kind: new.kind,
            amount: new.amount,
            merchant: new.merchant,
            category: new.category,
            timestamp: self.ctx.now(),
            status: TransactionStatus::Completed,
            description: new.description,
        };

        self.write().push_front(record.clone());
        info!(
            id = %record.id,
            card = record.card_id,
            kind = %record.kind,
            amount = %record.amount,
            "transaction recorded"
        );
        record
    }

    /// Whole log, newest first
    pub fn snapshot(&self) -> Vec<TransactionRecord> {
        self.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<TransactionRecord> {
        self.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn filter(&self, filter: &TransactionFilter) -> Vec<TransactionRecord> {
        self.read()
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over description, merchant and category
    ///
    /// An empty query returns the whole log.
    pub fn search(&self, query: &str) -> Vec<TransactionRecord> {
        let needle = query.to_lowercase();
        self.read()
            .iter()
            .filter(|tx| tx.matches_query(&needle))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfig;
    use crate::core::seed::MockLedger;
    use crate::core::test_support::{connected_context, context_with, test_now};
    use crate::types::{DateRange, Money, TransactionKind, WalletStatus};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    fn spend(card_id: CardId, amount: i64, merchant: &str) -> NewTransaction {
        NewTransaction {
            card_id,
            card_name: "Premium Card".to_string(),
            kind: TransactionKind::Spend,
            amount: Money::rupees(amount),
            merchant: Some(merchant.to_string()),
            category: "Shopping".to_string(),
            description: format!("Purchase at {}", merchant),
        }
    }

    #[tokio::test]
    async fn test_fetch_without_wallet_is_empty() {
        let (_wallet, ctx) = context_with(
            SessionConfig::instant(),
            WalletStatus::disconnected(),
            MockLedger::seeded(),
        );
        let log = TransactionLog::new(ctx);
        assert!(log.fetch(None).await.unwrap().is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_for_card() {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);

        let all = log.fetch(None).await.unwrap();
        assert_eq!(all.len(), 5);

        let ids: Vec<String> = log
            .fetch(Some(1))
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec!["tx_001", "tx_002", "tx_004"]);
    }

    #[tokio::test]
    async fn test_append_goes_to_the_front() {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);
        log.fetch(None).await.unwrap();

        let first = log.append(spend(1, 300, "Amazon"));
        let second = log.append(spend(1, 200, "Flipkart"));

        assert_ne!(first.id, second.id);
        assert_eq!(first.id, format!("tx_{}", test_now().timestamp_millis()));
        assert_eq!(first.status, TransactionStatus::Completed);
        assert_eq!(first.timestamp, test_now());

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 7);
        assert_eq!(snapshot[0], second);
        assert_eq!(snapshot[1], first);
        assert_eq!(snapshot[2].id, "tx_001");
    }

    #[tokio::test]
    async fn test_append_before_fetch_stays_newest() {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);

        let appended = log.append(spend(1, 300, "Amazon"));
        let fetched = log.fetch(None).await.unwrap();

        assert_eq!(fetched.len(), 6);
        assert_eq!(fetched[0], appended);
    }

    #[rstest]
    #[case::by_kind(
        TransactionFilter { kind: Some(TransactionKind::Spend), ..Default::default() },
        vec!["tx_001", "tx_003"]
    )]
    #[case::by_category(
        TransactionFilter { category: Some("Rewards".to_string()), ..Default::default() },
        vec!["tx_004"]
    )]
    #[case::by_merchant(
        TransactionFilter { merchant: Some("Amazon".to_string()), ..Default::default() },
        vec!["tx_003"]
    )]
    #[case::by_date(
        TransactionFilter {
            date_range: Some(DateRange {
                start: Utc.with_ymd_and_hms(2024, 1, 12, 12, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 1, 14, 10, 15, 0).unwrap(),
            }),
            ..Default::default()
        },
        vec!["tx_002", "tx_003", "tx_004"]
    )]
    #[tokio::test]
    async fn test_filter(#[case] filter: TransactionFilter, #[case] expected: Vec<&str>) {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);
        log.fetch(None).await.unwrap();

        let ids: Vec<String> = log.filter(&filter).into_iter().map(|tx| tx.id).collect();
        assert_eq!(ids, expected);
    }

    #[rstest]
    #[case("SWIGGY", vec!["tx_001"])]
    #[case("shopping", vec!["tx_003"])]
    #[case("payment", vec!["tx_002"])]
    #[case("nothing like this", vec![])]
    #[tokio::test]
    async fn test_search(#[case] query: &str, #[case] expected: Vec<&str>) {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);
        log.fetch(None).await.unwrap();

        let ids: Vec<String> = log.search(query).into_iter().map(|tx| tx.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_filtered_views_leave_log_unchanged() {
        let (_wallet, ctx) = connected_context(SessionConfig::instant());
        let log = TransactionLog::new(ctx);
        log.fetch(None).await.unwrap();
        let before = log.snapshot();

        log.search("swiggy");
        log.filter(&TransactionFilter {
            date_range: Some(DateRange {
                start: test_now() - Duration::days(1),
                end: test_now(),
            }),
            ..Default::default()
        });

        assert_eq!(log.snapshot(), before);
    }
}
