//! Simulated network calls
//!
//! Every store operation that stands in for a remote call goes through
//! [`Simulator::call`]: a fixed delay raced against the session's cancellation
//! scope, followed by the fault-injection check. Nothing is mutated before the
//! call returns `Ok`, so a cancelled or failed call leaves state untouched.
//!
//! # Scopes
//!
//! The simulator holds a root [`CancellationToken`] for the whole session and a
//! child token for the current wallet connection. Starting a new scope cancels
//! every delay still pending in the old one; shutting down cancels the root.

use crate::core::config::LatencyConfig;
use crate::types::LedgerError;
use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Operations that simulate a remote round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchCards,
    Mint,
    Spend,
    Repay,
    FetchTransactions,
    FetchCredit,
    FetchRewards,
    Redeem,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FetchCards => "fetch cards",
            Operation::Mint => "mint",
            Operation::Spend => "spend",
            Operation::Repay => "repay",
            Operation::FetchTransactions => "fetch transactions",
            Operation::FetchCredit => "fetch credit profile",
            Operation::FetchRewards => "fetch rewards",
            Operation::Redeem => "redeem",
        }
    }
}

/// Makes chosen operations fail on demand
///
/// An armed operation fails with [`LedgerError::SimulatedFailure`] on each of its
/// next `times` calls, then succeeds again.
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: DashMap<Operation, u32>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, operation: Operation, times: u32) {
        if times == 0 {
            self.armed.remove(&operation);
        } else {
            self.armed.insert(operation, times);
        }
    }

    pub fn disarm(&self, operation: Operation) {
        self.armed.remove(&operation);
    }

    /// Consume one armed failure for `operation`, if any
    pub fn trip(&self, operation: Operation) -> Result<(), LedgerError> {
        let fired = match self.armed.get_mut(&operation) {
            Some(mut remaining) => {
                *remaining.value_mut() -= 1;
                Some(*remaining.value())
            }
            None => None,
        };

        match fired {
            Some(left) => {
                if left == 0 {
                    self.armed.remove(&operation);
                }
                Err(LedgerError::simulated_failure(operation.as_str()))
            }
            None => Ok(()),
        }
    }
}

/// Latency, cancellation and fault injection shared by a session's stores
#[derive(Debug)]
pub struct Simulator {
    latency: LatencyConfig,
    faults: FaultInjector,
    root: CancellationToken,
    scope: Mutex<CancellationToken>,
}

impl Simulator {
    pub fn new(latency: LatencyConfig) -> Self {
        let root = CancellationToken::new();
        let scope = Mutex::new(root.child_token());
        Self {
            latency,
            faults: FaultInjector::new(),
            root,
            scope,
        }
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn latency(&self) -> &LatencyConfig {
        &self.latency
    }

    fn current_scope(&self) -> CancellationToken {
        self.scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one simulated round trip for `operation`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The delay elapsed and no fault was armed
    /// * `Err(LedgerError::Cancelled)` - The scope was cancelled first
    /// * `Err(LedgerError::SimulatedFailure)` - A fault was armed for the operation
    pub async fn call(&self, operation: Operation) -> Result<(), LedgerError> {
        let delay = self.latency.for_operation(operation);
        let scope = self.current_scope();

        debug!(
            operation = operation.as_str(),
            delay_ms = delay.as_millis() as u64,
            "simulated call"
        );

        if scope.is_cancelled() {
            return Err(LedgerError::cancelled(operation.as_str()));
        }

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = scope.cancelled() => {
                    return Err(LedgerError::cancelled(operation.as_str()));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.faults.trip(operation)
    }

    /// Cancel the current scope and open a fresh one
    pub fn begin_scope(&self) {
        let mut scope = self.scope.lock().unwrap_or_else(PoisonError::into_inner);
        scope.cancel();
        *scope = self.root.child_token();
    }

    /// Token cancelled when the whole session shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn shutdown(&self) {
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}
