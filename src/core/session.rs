//! Session scope and coordinating use-cases
//!
//! A [`Session`] owns one instance of every store, all sharing the same wallet
//! observer, clock, ledger source and simulator. It is the only place that
//! sequences work across stores.
//!
//! # Flows
//!
//! `complete_spend`, `complete_repayment` and `complete_mint` run in three steps:
//! card mutation, transaction append, score update. If the card mutation fails the
//! error is returned and nothing else happens. Anything that falls short after
//! that point is logged and reported as a [`FlowWarning`]; the card change stands.
//!
//! # Wallet changes
//!
//! [`Session::sync_wallet`] compares the observed account with the one the stores
//! were loaded for. On any change it cancels in-flight calls, clears every store
//! and, if a wallet is connected, loads everything again.

use crate::core::card_store::{CardStore, MintReceipt, RepaymentReceipt, SpendReceipt};
use crate::core::config::SessionConfig;
use crate::core::context::StoreContext;
use crate::core::credit_store::CreditStore;
use crate::core::merchants::MerchantDirectory;
use crate::core::rewards_store::RewardsStore;
use crate::core::seed::MockLedger;
use crate::core::simulator::FaultInjector;
use crate::core::traits::{Clock, LedgerSource, SystemClock};
use crate::core::transaction_log::TransactionLog;
use crate::types::{
    Card, CardId, CardTier, CreditProfile, LedgerError, Money, NewTransaction, RepaymentPlan,
    RewardsSnapshot, ScoreChange, ScoreEvent, TransactionKind, TransactionRecord, WalletStatus,
};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Something a flow could not finish after its card mutation succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowWarning {
    /// The score was not updated because no credit profile was loaded
    CreditProfileNotLoaded,
}

impl fmt::Display for FlowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowWarning::CreditProfileNotLoaded => {
                f.write_str("credit profile not loaded; score unchanged")
            }
        }
    }
}

/// Everything a completed flow produced
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport<T> {
    /// Receipt of the card mutation
    pub outcome: T,
    /// Log entry appended for the mutation
    pub transaction: TransactionRecord,
    /// Score movement, if the flow updates the score and a profile was loaded
    pub score: Option<ScoreChange>,
    pub warnings: Vec<FlowWarning>,
}

/// Result of fetching every store at once
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub cards: Vec<Card>,
    pub transactions: Vec<TransactionRecord>,
    pub credit: Option<CreditProfile>,
    pub rewards: Option<RewardsSnapshot>,
}

#[derive(Debug)]
pub struct Session {
    ctx: StoreContext,
    cards: CardStore,
    transactions: TransactionLog,
    credit: CreditStore,
    rewards: RewardsStore,
    merchants: MerchantDirectory,
    /// Account the stores currently hold data for
    loaded_account: Mutex<Option<String>>,
}

impl Session {
    /// Session over the seeded mock ledger
    pub fn new(
        config: SessionConfig,
        wallet: watch::Receiver<WalletStatus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_ledger(config, wallet, clock, Arc::new(MockLedger::seeded()))
    }

    /// Session over the seeded mock ledger and the system clock
    pub fn with_system_clock(config: SessionConfig, wallet: watch::Receiver<WalletStatus>) -> Self {
        Self::new(config, wallet, Arc::new(SystemClock))
    }

    pub fn with_ledger(
        config: SessionConfig,
        wallet: watch::Receiver<WalletStatus>,
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn LedgerSource>,
    ) -> Self {
        let ctx = StoreContext::new(config, wallet, clock, ledger);
        let loaded_account = Mutex::new(ctx.active_account());
        Self {
            cards: CardStore::new(ctx.clone()),
            transactions: TransactionLog::new(ctx.clone()),
            credit: CreditStore::new(ctx.clone()),
            rewards: RewardsStore::new(ctx.clone()),
            merchants: MerchantDirectory::new(),
            loaded_account,
            ctx,
        }
    }

    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    pub fn transactions(&self) -> &TransactionLog {
        &self.transactions
    }

    pub fn credit(&self) -> &CreditStore {
        &self.credit
    }

    pub fn rewards(&self) -> &RewardsStore {
        &self.rewards
    }

    pub fn merchants(&self) -> &MerchantDirectory {
        &self.merchants
    }

    pub fn faults(&self) -> &FaultInjector {
        self.ctx.simulator.faults()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    pub fn wallet(&self) -> WalletStatus {
        self.ctx.wallet.borrow().clone()
    }

    /// Fetch all four stores concurrently
    pub async fn refresh(&self) -> Result<SessionSnapshot, LedgerError> {
        let (cards, transactions, credit, rewards) = futures::try_join!(
            self.cards.fetch(),
            self.transactions.fetch(None),
            self.credit.fetch(),
            self.rewards.fetch(),
        )?;

        Ok(SessionSnapshot {
            cards,
            transactions,
            credit,
            rewards,
        })
    }

    fn reset_stores(&self) {
        self.cards.reset();
        self.transactions.reset();
        self.credit.reset();
        self.rewards.reset();
    }

    /// React to the current wallet status
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The account did not change
    /// * `Ok(Some(snapshot))` - The stores were reset and reloaded (empty when disconnected)
    pub async fn sync_wallet(&self) -> Result<Option<SessionSnapshot>, LedgerError> {
        let current = self.ctx.active_account();
        {
            let mut loaded = self
                .loaded_account
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *loaded == current {
                return Ok(None);
            }

            info!(
                from = loaded.as_deref().unwrap_or("-"),
                to = current.as_deref().unwrap_or("-"),
                "wallet changed; resetting session"
            );
            self.ctx.simulator.begin_scope();
            self.reset_stores();
            *loaded = current;
        }

        self.refresh().await.map(Some)
    }

    /// Follow wallet changes in a background task until the session is closed
    pub fn watch_wallet(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let mut wallet = self.ctx.wallet.clone();
        let shutdown = self.ctx.simulator.shutdown_token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    changed = wallet.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if let Err(error) = session.sync_wallet().await {
                            warn!(%error, "reload after wallet change failed");
                        }
                    }
                }
            }
        })
    }

    /// Cancel every pending call and stop the wallet watcher
    pub fn close(&self) {
        self.ctx.simulator.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.ctx.simulator.is_shut_down()
    }

    fn score(&self, event: ScoreEvent, warnings: &mut Vec<FlowWarning>) -> Option<ScoreChange> {
        let change = self.credit.update_after_transaction(event);
        if change.is_none() {
            warn!(?event, "credit profile not loaded; score left unchanged");
            warnings.push(FlowWarning::CreditProfileNotLoaded);
        }
        change
    }

    /// Spend at a merchant, record it and nudge the score
    pub async fn complete_spend(
        &self,
        card_id: CardId,
        amount: Money,
        merchant: &str,
    ) -> Result<FlowReport<SpendReceipt>, LedgerError> {
        let receipt = self.cards.spend(card_id, amount, merchant).await?;

        let transaction = self.transactions.append(NewTransaction {
            card_id,
            card_name: receipt.card_name.clone(),
            kind: TransactionKind::Spend,
            amount,
            merchant: Some(merchant.to_string()),
            category: self.merchants.category_for(merchant).to_string(),
            description: format!("Purchase at {}", merchant),
        });

        let mut warnings = Vec::new();
        let score = self.score(ScoreEvent::Spend { amount }, &mut warnings);

        Ok(FlowReport {
            outcome: receipt,
            transaction,
            score,
            warnings,
        })
    }

    /// Repay a card according to `plan`, record it and update the score
    pub async fn complete_repayment(
        &self,
        card_id: CardId,
        plan: RepaymentPlan,
        on_time: bool,
    ) -> Result<FlowReport<RepaymentReceipt>, LedgerError> {
        self.ctx.require_account()?;
        let card = self
            .cards
            .get(card_id)
            .ok_or_else(|| LedgerError::card_not_found(card_id))?;
        let amount = plan.amount(card.outstanding());

        let receipt = self.cards.repay(card_id, amount).await?;

        let transaction = self.transactions.append(NewTransaction {
            card_id,
            card_name: receipt.card_name.clone(),
            kind: TransactionKind::Repayment,
            amount: receipt.applied,
            merchant: None,
            category: "Repayment".to_string(),
            description: plan.description().to_string(),
        });

        let mut warnings = Vec::new();
        let score = self.score(ScoreEvent::Repayment { on_time }, &mut warnings);

        Ok(FlowReport {
            outcome: receipt,
            transaction,
            score,
            warnings,
        })
    }

    /// Mint a card and record the deposit; minting never moves the score
    pub async fn complete_mint(
        &self,
        deposit: Money,
        tier: CardTier,
    ) -> Result<FlowReport<MintReceipt>, LedgerError> {
        let receipt = self.cards.mint(deposit, tier).await?;

        let transaction = self.transactions.append(NewTransaction {
            card_id: receipt.card.id,
            card_name: receipt.card.name(),
            kind: TransactionKind::Mint,
            amount: deposit,
            merchant: None,
            category: "Card Mint".to_string(),
            description: "New card minted".to_string(),
        });

        Ok(FlowReport {
            outcome: receipt,
            transaction,
            score: None,
            warnings: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LatencyConfig, RepaymentPolicy};
    use crate::core::simulator::Operation;
    use crate::core::test_support::test_now;
    use crate::core::traits::ManualClock;
    use rstest::rstest;
    use std::time::Duration;

    fn session_for(
        config: SessionConfig,
        wallet: WalletStatus,
        ledger: MockLedger,
    ) -> (watch::Sender<WalletStatus>, Session) {
        let (tx, rx) = watch::channel(wallet);
        let session = Session::with_ledger(
            config,
            rx,
            Arc::new(ManualClock::new(test_now())),
            Arc::new(ledger),
        );
        (tx, session)
    }

    async fn connected_session() -> (watch::Sender<WalletStatus>, Session) {
        let (tx, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::connected("0xabc"),
            MockLedger::seeded(),
        );
        session.refresh().await.unwrap();
        (tx, session)
    }

    #[tokio::test]
    async fn test_refresh_loads_everything() {
        let (_wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::connected("0xabc"),
            MockLedger::seeded(),
        );
        let snapshot = session.refresh().await.unwrap();

        assert_eq!(snapshot.cards.len(), 3);
        assert_eq!(snapshot.transactions.len(), 5);
        assert_eq!(snapshot.credit.unwrap().score.value(), 742);
        assert_eq!(snapshot.rewards.unwrap().balance.ct_tokens, 1247);
    }

    #[tokio::test]
    async fn test_refresh_without_wallet_is_empty() {
        let (_wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::disconnected(),
            MockLedger::seeded(),
        );
        let snapshot = session.refresh().await.unwrap();
        assert!(snapshot.cards.is_empty());
        assert!(snapshot.transactions.is_empty());
        assert_eq!(snapshot.credit, None);
        assert_eq!(snapshot.rewards, None);
    }

    #[tokio::test]
    async fn test_clamped_repayment_of_settled_card_changes_nothing() {
        let (_wallet, session) = session_for(
            SessionConfig::instant().with_repayment_policy(RepaymentPolicy::ClampToLimit),
            WalletStatus::connected("0xabc"),
            MockLedger::seeded(),
        );
        session.refresh().await.unwrap();
        session
            .complete_repayment(3, RepaymentPlan::Full, true)
            .await
            .unwrap();

        let score = session.credit().profile().unwrap().score.value();
        let logged = session.transactions().len();

        let result = session
            .complete_repayment(3, RepaymentPlan::Custom(Money::rupees(500)), true)
            .await;

        assert_eq!(result.unwrap_err(), LedgerError::invalid_amount(Money::ZERO, "repay"));
        assert_eq!(session.credit().profile().unwrap().score.value(), score);
        assert_eq!(session.transactions().len(), logged);
        assert_eq!(session.cards().get(3).unwrap().remaining_balance, Money::rupees(5000));
    }

    #[tokio::test]
    async fn test_mutations_without_wallet_fail_with_not_connected() {
        let (_wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::disconnected(),
            MockLedger::seeded(),
        );

        assert_eq!(
            session
                .complete_repayment(1, RepaymentPlan::Full, true)
                .await
                .unwrap_err(),
            LedgerError::WalletNotConnected
        );
        assert_eq!(
            session
                .complete_spend(1, Money::rupees(100), "Uber")
                .await
                .unwrap_err(),
            LedgerError::WalletNotConnected
        );
        assert_eq!(
            session
                .complete_mint(Money::rupees(1000), CardTier::Starter)
                .await
                .unwrap_err(),
            LedgerError::WalletNotConnected
        );
        assert_eq!(
            session.rewards().redeem("redeem_001").await.unwrap_err(),
            LedgerError::WalletNotConnected
        );
    }

    #[tokio::test]
    async fn test_complete_spend() {
        let (_wallet, session) = connected_session().await;

        let report = session
            .complete_spend(1, Money::rupees(400), "Zomato")
            .await
            .unwrap();

        assert_eq!(report.outcome.remaining_balance, Money::rupees(15_000));
        assert_eq!(report.transaction.kind, TransactionKind::Spend);
        assert_eq!(report.transaction.category, "Food & Dining");
        assert_eq!(report.transaction.description, "Purchase at Zomato");
        assert_eq!(report.transaction.card_name, "Premium Card");
        assert_eq!(report.score.unwrap().current.value(), 743);
        assert!(report.warnings.is_empty());

        assert_eq!(session.transactions().latest().unwrap(), report.transaction);
        assert_eq!(
            session.credit().profile().unwrap().total_spent,
            Money::rupees(246_000)
        );
    }

    #[tokio::test]
    async fn test_rejected_spend_touches_nothing() {
        let (_wallet, session) = connected_session().await;

        let result = session
            .complete_spend(3, Money::rupees(5000), "Amazon")
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));

        assert_eq!(session.transactions().len(), 5);
        assert_eq!(session.credit().profile().unwrap().score.value(), 742);
    }

    #[tokio::test]
    async fn test_spend_without_credit_profile_warns() {
        let (_wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::connected("0xabc"),
            MockLedger::seeded(),
        );
        session.cards().fetch().await.unwrap();

        let report = session
            .complete_spend(1, Money::rupees(100), "Uber")
            .await
            .unwrap();
        assert_eq!(report.score, None);
        assert_eq!(report.warnings, vec![FlowWarning::CreditProfileNotLoaded]);
        assert_eq!(report.transaction.category, "Transportation");
    }

    #[rstest]
    #[case::full(RepaymentPlan::Full, 4600, "Full payment", 744)]
    #[case::half(RepaymentPlan::Half, 2300, "Partial payment", 744)]
    #[case::minimum(RepaymentPlan::Minimum, 460, "Minimum payment", 744)]
    #[tokio::test]
    async fn test_complete_repayment(
        #[case] plan: RepaymentPlan,
        #[case] amount: i64,
        #[case] description: &str,
        #[case] score: u16,
    ) {
        let (_wallet, session) = connected_session().await;

        let report = session.complete_repayment(1, plan, true).await.unwrap();
        assert_eq!(report.outcome.applied, Money::rupees(amount));
        assert_eq!(
            report.outcome.remaining_balance,
            Money::rupees(15_400 + amount)
        );
        assert_eq!(report.transaction.kind, TransactionKind::Repayment);
        assert_eq!(report.transaction.amount, Money::rupees(amount));
        assert_eq!(report.transaction.description, description);
        assert_eq!(report.transaction.merchant, None);
        assert_eq!(report.score.unwrap().current.value(), score);

        let profile = session.credit().profile().unwrap();
        assert_eq!(profile.on_time_payments, 143);
    }

    #[tokio::test]
    async fn test_late_repayment_lowers_score() {
        let (_wallet, session) = connected_session().await;
        let report = session
            .complete_repayment(2, RepaymentPlan::Custom(Money::rupees(800)), false)
            .await
            .unwrap();
        assert_eq!(report.score.unwrap().current.value(), 741);
        assert_eq!(session.credit().profile().unwrap().late_payments, 15);
    }

    #[tokio::test]
    async fn test_repayment_of_settled_card_is_invalid() {
        let (_wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::connected("0xabc"),
            MockLedger::without_cards(),
        );
        session.refresh().await.unwrap();
        session
            .complete_mint(Money::rupees(1000), CardTier::Starter)
            .await
            .unwrap();

        let result = session
            .complete_repayment(1, RepaymentPlan::Full, true)
            .await;
        assert_eq!(
            result,
            Err(LedgerError::invalid_amount(Money::ZERO, "repay"))
        );
    }

    #[tokio::test]
    async fn test_mint_spend_repay_scenario() {
        let config = SessionConfig::instant().with_repayment_policy(RepaymentPolicy::Uncapped);
        let (_wallet, session) = session_for(
            config,
            WalletStatus::connected("0xabc"),
            MockLedger::without_cards(),
        );
        session.refresh().await.unwrap();

        let mint = session
            .complete_mint(Money::rupees(1000), CardTier::Starter)
            .await
            .unwrap();
        let id = mint.outcome.card.id;
        assert_eq!(mint.transaction.kind, TransactionKind::Mint);
        assert_eq!(mint.transaction.category, "Card Mint");
        assert_eq!(mint.score, None);

        session
            .complete_spend(id, Money::rupees(300), "Swiggy")
            .await
            .unwrap();
        session
            .complete_repayment(id, RepaymentPlan::Custom(Money::rupees(500)), true)
            .await
            .unwrap();

        assert_eq!(
            session.cards().get(id).unwrap().remaining_balance,
            Money::rupees(2200)
        );

        let kinds: Vec<TransactionKind> = session
            .transactions()
            .snapshot()
            .iter()
            .map(|tx| tx.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Repayment,
                TransactionKind::Spend,
                TransactionKind::Mint
            ]
        );
        assert_eq!(session.credit().profile().unwrap().score.value(), 745);
    }

    #[tokio::test]
    async fn test_sync_wallet_resets_on_account_change() {
        let (wallet, session) = connected_session().await;
        session
            .complete_spend(1, Money::rupees(400), "Swiggy")
            .await
            .unwrap();

        assert_eq!(session.sync_wallet().await.unwrap(), None);

        wallet.send_replace(WalletStatus::connected("0xdef"));
        let snapshot = session.sync_wallet().await.unwrap().unwrap();
        assert_eq!(snapshot.cards[0].remaining_balance, Money::rupees(15_400));
        assert_eq!(snapshot.transactions.len(), 5);

        wallet.send_replace(WalletStatus::disconnected());
        let snapshot = session.sync_wallet().await.unwrap().unwrap();
        assert!(snapshot.cards.is_empty());
        assert!(session.cards().is_empty());
        assert_eq!(session.credit().profile(), None);
        assert_eq!(session.rewards().balance(), None);
    }

    #[tokio::test]
    async fn test_wallet_change_cancels_in_flight_spend() {
        let latency = LatencyConfig {
            spend: Duration::from_secs(30),
            ..LatencyConfig::instant()
        };
        let (wallet, session) = session_for(
            SessionConfig::instant().with_latency(latency),
            WalletStatus::connected("0xabc"),
            MockLedger::seeded(),
        );
        let session = Arc::new(session);
        session.refresh().await.unwrap();

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .complete_spend(1, Money::rupees(100), "Uber")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        wallet.send_replace(WalletStatus::disconnected());
        session.sync_wallet().await.unwrap();

        assert_eq!(
            pending.await.unwrap(),
            Err(LedgerError::cancelled("spend"))
        );
        assert!(session.transactions().is_empty());
    }

    #[tokio::test]
    async fn test_watch_wallet_follows_changes() {
        let (wallet, session) = session_for(
            SessionConfig::instant(),
            WalletStatus::disconnected(),
            MockLedger::seeded(),
        );
        let session = Arc::new(session);
        let watcher = session.watch_wallet();

        wallet.send_replace(WalletStatus::connected("0xabc"));
        for _ in 0..100 {
            if session.cards().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(session.cards().len(), 3);
        assert_eq!(session.rewards().balance().unwrap().ct_tokens, 1247);

        session.close();
        watcher.await.unwrap();
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_injected_fault_fails_flow_cleanly() {
        let (_wallet, session) = connected_session().await;
        session.faults().arm(Operation::Mint, 1);

        let result = session
            .complete_mint(Money::rupees(2000), CardTier::Starter)
            .await;
        assert_eq!(result, Err(LedgerError::simulated_failure("mint")));
        assert_eq!(session.cards().len(), 3);
        assert_eq!(session.transactions().len(), 5);

        let report = session
            .complete_mint(Money::rupees(2000), CardTier::Starter)
            .await
            .unwrap();
        assert_eq!(report.outcome.card.id, 4);
    }
}
