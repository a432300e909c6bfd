//! CT token rewards of the connected wallet
//!
//! Holds the reward balance, the cashback history (newest first) and the
//! redemption catalog. Redemptions validate twice: once before the simulated call
//! so a doomed request fails fast, and again under the write lock afterwards, so
//! two overlapping redemptions can never take the balance below zero.

use crate::core::context::StoreContext;
use crate::core::simulator::Operation;
use crate::types::{
    CashbackEntry, LedgerError, Money, RedemptionOption, RedemptionReceipt, ReferralSummary,
    RewardBalance, RewardsSnapshot,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Rupees of cashback per CT token earned
const RUPEES_PER_TOKEN: i64 = 10;

#[derive(Debug, Clone)]
struct RewardsState {
    balance: RewardBalance,
    cashback_history: VecDeque<CashbackEntry>,
    redemption_options: Vec<RedemptionOption>,
}

impl From<RewardsSnapshot> for RewardsState {
    fn from(snapshot: RewardsSnapshot) -> Self {
        Self {
            balance: snapshot.balance,
            cashback_history: snapshot.cashback_history.into(),
            redemption_options: snapshot.redemption_options,
        }
    }
}

impl RewardsState {
    fn snapshot(&self) -> RewardsSnapshot {
        RewardsSnapshot {
            balance: self.balance.clone(),
            cashback_history: self.cashback_history.iter().cloned().collect(),
            redemption_options: self.redemption_options.clone(),
        }
    }

    /// Option the balance can pay for right now
    fn redeemable(&self, option_id: &str) -> Result<&RedemptionOption, LedgerError> {
        let option = self
            .redemption_options
            .iter()
            .find(|option| option.id == option_id)
            .ok_or_else(|| LedgerError::invalid_redemption_option(option_id))?;

        if !option.available {
            return Err(LedgerError::redemption_unavailable(option_id));
        }
        if self.balance.ct_tokens < option.cost_in_ct {
            return Err(LedgerError::insufficient_tokens(
                self.balance.ct_tokens,
                option.cost_in_ct,
            ));
        }
        Ok(option)
    }
}

#[derive(Debug)]
pub struct RewardsStore {
    ctx: StoreContext,
    state: RwLock<Option<RewardsState>>,
}

impl RewardsStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<RewardsState>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<RewardsState>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reset(&self) {
        *self.write() = None;
    }

    /// Load balance, cashback history and catalog
    ///
    /// `Ok(None)` without a connected wallet.
    pub async fn fetch(&self) -> Result<Option<RewardsSnapshot>, LedgerError> {
        let Some(account) = self.ctx.active_account() else {
            return Ok(None);
        };

        self.ctx.simulator.call(Operation::FetchRewards).await?;

        let mut state = self.write();
        let loaded =
            state.get_or_insert_with(|| RewardsState::from(self.ctx.ledger.rewards(&account)));
        Ok(Some(loaded.snapshot()))
    }

    pub fn snapshot(&self) -> Option<RewardsSnapshot> {
        self.read().as_ref().map(RewardsState::snapshot)
    }

    pub fn balance(&self) -> Option<RewardBalance> {
        self.read().as_ref().map(|state| state.balance.clone())
    }

    /// Credit cashback for a purchase
    ///
    /// Earns one CT token per whole ₹10. Returns `Ok(None)` and changes nothing
    /// when rewards have not been loaded.
    pub fn earn_cashback(
        &self,
        amount: Money,
        source: &str,
        transaction_id: &str,
    ) -> Result<Option<CashbackEntry>, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::invalid_amount(amount, "cashback"));
        }

        let mut guard = self.write();
        let Some(state) = guard.as_mut() else {
            return Ok(None);
        };

        let cashback_earned = state
            .balance
            .cashback_earned
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("cashback"))?;
        let tokens = amount.whole_units_of(Decimal::from(RUPEES_PER_TOKEN));

        let entry = CashbackEntry {
            id: self.ctx.next_id("cb"),
            amount,
            source: source.to_string(),
            date: self.ctx.now(),
            transaction_id: transaction_id.to_string(),
        };

        state.balance.cashback_earned = cashback_earned;
        state.balance.ct_tokens = state.balance.ct_tokens.saturating_add(tokens);
        state.cashback_history.push_front(entry.clone());

        info!(
            id = %entry.id,
            amount = %amount,
            tokens,
            balance = state.balance.ct_tokens,
            "cashback credited"
        );
        Ok(Some(entry))
    }

    /// Exchange CT tokens for a catalog option
    ///
    /// # Returns
    ///
    /// * `Ok(RedemptionReceipt)` - Tokens were deducted
    /// * `Err(LedgerError::WalletNotConnected)` - No wallet is connected
    /// * `Err(LedgerError::RewardsUnavailable)` - Rewards were never loaded
    /// * `Err(LedgerError::InvalidRedemptionOption)` - Unknown option id
    /// * `Err(LedgerError::RedemptionUnavailable)` - The option is switched off
    /// * `Err(LedgerError::InsufficientTokens)` - The balance does not cover the cost
    pub async fn redeem(&self, option_id: &str) -> Result<RedemptionReceipt, LedgerError> {
        self.ctx.require_account()?;
        {
            let guard = self.read();
            let state = guard.as_ref().ok_or(LedgerError::RewardsUnavailable)?;
            state.redeemable(option_id)?;
        }

        self.ctx.simulator.call(Operation::Redeem).await?;

        let mut guard = self.write();
        let state = guard.as_mut().ok_or(LedgerError::RewardsUnavailable)?;
        let (cost, value) = {
            let option = state.redeemable(option_id)?;
            (option.cost_in_ct, option.value)
        };

        let total_redeemed = state
            .balance
            .total_redeemed
            .checked_add(value)
            .ok_or_else(|| LedgerError::arithmetic_overflow("redeem"))?;
        state.balance.ct_tokens -= cost;
        state.balance.total_redeemed = total_redeemed;

        let receipt = RedemptionReceipt {
            redemption_id: self.ctx.next_id("redeem"),
            option_id: option_id.to_string(),
            tokens_spent: cost,
            tokens_remaining: state.balance.ct_tokens,
        };
        info!(
            option = option_id,
            cost,
            remaining = receipt.tokens_remaining,
            "rewards redeemed"
        );
        Ok(receipt)
    }

    /// Referral programme summary for the connected wallet
    pub fn referral_rewards(&self) -> Result<ReferralSummary, LedgerError> {
        let account = self.ctx.require_account()?;
        Ok(self.ctx.ledger.referral_summary(&account))
    }
}
