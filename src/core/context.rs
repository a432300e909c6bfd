//! Shared handles every store is built from

use crate::core::config::SessionConfig;
use crate::core::simulator::Simulator;
use crate::core::traits::{Clock, LedgerSource};
use crate::types::{LedgerError, WalletStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::watch;

/// Issues `<prefix>_<millis>` identifiers
///
/// The millisecond part is strictly increasing across every id the generator hands
/// out, so two ids issued within the same millisecond still differ.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: &str, now: DateTime<Utc>) -> String {
        let now_ms = now.timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Acquire);
        loop {
            let candidate = now_ms.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return format!("{}_{}", prefix, candidate),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Wallet, clock, seed source and simulator handles shared by a session's stores
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub config: Arc<SessionConfig>,
    pub wallet: watch::Receiver<WalletStatus>,
    pub simulator: Arc<Simulator>,
    pub clock: Arc<dyn Clock>,
    pub ledger: Arc<dyn LedgerSource>,
    pub ids: Arc<IdGenerator>,
}

impl StoreContext {
    pub fn new(
        config: SessionConfig,
        wallet: watch::Receiver<WalletStatus>,
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn LedgerSource>,
    ) -> Self {
        let simulator = Arc::new(Simulator::new(config.latency.clone()));
        Self {
            config: Arc::new(config),
            wallet,
            simulator,
            clock,
            ledger,
            ids: Arc::new(IdGenerator::new()),
        }
    }

    /// Account of the wallet if it is connected right now
    pub fn active_account(&self) -> Option<String> {
        self.wallet.borrow().active_account().map(str::to_string)
    }

    pub fn require_account(&self) -> Result<String, LedgerError> {
        self.active_account().ok_or(LedgerError::WalletNotConnected)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn next_id(&self, prefix: &str) -> String {
        self.ids.next(prefix, self.clock.now())
    }
}
