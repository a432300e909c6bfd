//! Core traits for the session's injected capabilities
//!
//! Stores never reach for the system clock or the seed data directly. Both come in
//! through these traits so tests can pin time and replace the mock ledger.

use crate::types::{Card, CreditProfile, ReferralSummary, RewardsSnapshot, TransactionRecord};
use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Where a session's initial state comes from when a wallet connects
///
/// Each store asks the source once per connected account, on first access.
pub trait LedgerSource: Send + Sync + Debug {
    /// Cards already minted by the account
    fn cards(&self, account: &str) -> Vec<Card>;

    /// Transaction history, newest first
    fn transactions(&self, account: &str) -> Vec<TransactionRecord>;

    fn credit_profile(&self, account: &str) -> CreditProfile;

    fn rewards(&self, account: &str) -> RewardsSnapshot;

    fn referral_summary(&self, account: &str) -> ReferralSummary;
}
