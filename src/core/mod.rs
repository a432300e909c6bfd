//! Core session logic
//!
//! This module contains the session and the stores it owns:
//! - `traits` - Clock and ledger-source abstractions injected into every store
//! - `config` - Session tunables: latencies, repayment policy, mint rules
//! - `simulator` - Simulated round trips with cancellation and fault injection
//! - `context` - Shared handles and id generation
//! - `card_store` - Cards and the mint, spend and repay operations
//! - `transaction_log` - Append-only transaction history
//! - `credit_store` - Credit-score aggregate
//! - `rewards_store` - CT tokens, cashback and redemptions
//! - `session` - Wallet-scoped session and the cross-store flows
//! - `analytics` - Derived views over cards and transactions
//! - `seed` / `merchants` - Mock ledger data and the merchant directory

pub mod analytics;
pub mod card_store;
pub mod config;
pub mod context;
pub mod credit_store;
pub mod merchants;
pub mod rewards_store;
pub mod seed;
pub mod session;
pub mod simulator;
pub mod traits;
pub mod transaction_log;

#[cfg(test)]
pub(crate) mod test_support;

pub use card_store::{CardStore, MintReceipt, RepaymentReceipt, SpendReceipt};
pub use config::{LatencyConfig, RepaymentPolicy, SessionConfig};
pub use context::{IdGenerator, StoreContext};
pub use credit_store::CreditStore;
pub use merchants::MerchantDirectory;
pub use rewards_store::RewardsStore;
pub use seed::MockLedger;
pub use session::{FlowReport, FlowWarning, Session, SessionSnapshot};
pub use simulator::{FaultInjector, Operation, Simulator};
pub use traits::{Clock, LedgerSource, ManualClock, SystemClock};
pub use transaction_log::TransactionLog;
