//! Credit-profile aggregate of the connected wallet

use crate::core::context::StoreContext;
use crate::core::simulator::Operation;
use crate::types::{CreditProfile, LedgerError, ScoreChange, ScoreEvent, ScorePoint};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Debug)]
pub struct CreditStore {
    ctx: StoreContext,
    profile: RwLock<Option<CreditProfile>>,
}

impl CreditStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            profile: RwLock::new(None),
        }
    }

    /// Load the profile, hydrating it from the ledger on first access
    ///
    /// `Ok(None)` without a connected wallet.
    pub async fn fetch(&self) -> Result<Option<CreditProfile>, LedgerError> {
        let Some(account) = self.ctx.active_account() else {
            return Ok(None);
        };

        self.ctx.simulator.call(Operation::FetchCredit).await?;

        let mut profile = self.profile.write().unwrap_or_else(PoisonError::into_inner);
        let loaded = profile.get_or_insert_with(|| self.ctx.ledger.credit_profile(&account));
        Ok(Some(loaded.clone()))
    }

    pub fn profile(&self) -> Option<CreditProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Apply the score effect of a completed card event
    ///
    /// Returns `None` and changes nothing when no profile has been loaded.
    pub fn update_after_transaction(&self, event: ScoreEvent) -> Option<ScoreChange> {
        let now = self.ctx.now();
        let mut guard = self.profile.write().unwrap_or_else(PoisonError::into_inner);
        let Some(profile) = guard.as_mut() else {
            debug!(?event, "no credit profile loaded; score update skipped");
            return None;
        };

        let delta = event.delta();
        let previous = profile.score;
        profile.score = previous.adjusted(delta);
        profile.total_transactions = profile.total_transactions.saturating_add(1);

        match event {
            ScoreEvent::Spend { amount } => {
                // Only fails past Decimal's range; the total then stays put
                if let Some(total) = profile.total_spent.checked_add(amount) {
                    profile.total_spent = total;
                }
            }
            ScoreEvent::Repayment { on_time: true } => {
                profile.on_time_payments = profile.on_time_payments.saturating_add(1);
            }
            ScoreEvent::Repayment { on_time: false } => {
                profile.late_payments = profile.late_payments.saturating_add(1);
            }
        }

        profile.last_updated = now;

        let label = now.format("%Y-%m").to_string();
        match profile.score_history.last_mut() {
            Some(point) if point.label == label => point.score = profile.score,
            _ => profile.score_history.push(ScorePoint {
                label,
                score: profile.score,
            }),
        }

        let change = ScoreChange {
            previous,
            current: profile.score,
            delta,
        };
        info!(
            previous = %change.previous,
            current = %change.current,
            delta,
            "credit score updated"
        );
        Some(change)
    }
}
