//! Spend-card session engine
//! # Overview
//!
//! This library models the client-side state of a Web3 credit-card dashboard:
//! virtual spend cards minted against a deposit, spends and repayments on those
//! cards, an append-only transaction log, a credit-score aggregate and a CT token
//! rewards programme. Everything lives in memory, starts from a mock ledger, and
//! every "network" call is simulated with a fixed, cancellable delay.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Money, Card, TransactionRecord, CreditProfile, ...)
//! - [`core`] - Session and stores:
//!   - [`core::card_store`] - Mint, spend and repay with per-card locking
//!   - [`core::transaction_log`] - Newest-first history with filter and search
//!   - [`core::credit_store`] - Score updates clamped to 300..=850
//!   - [`core::rewards_store`] - Cashback, token balance and redemptions
//!   - [`core::session`] - Wallet-scoped session and the cross-store flows
//!   - [`core::analytics`] - Utilization, category breakdown, top merchants
//! - [`io`] - Scenario CSV parsing and card output
//! - [`replay`] - Scenario replay driving a session from a CSV script
//! - [`cli`] - CLI arguments parsing
//!
//! # Wallet
//!
//! The engine never owns a wallet. A session observes a
//! `tokio::sync::watch::Receiver<WalletStatus>`; without a connected account every
//! fetch returns empty, and mint, spend, repay and redeem fail with
//! [`LedgerError::WalletNotConnected`]. Cashback is skipped (`Ok(None)`) because
//! rewards are never loaded.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod replay;
pub mod types;

pub use core::{RepaymentPolicy, Session, SessionConfig};
pub use io::write_cards_csv;
pub use replay::{ReplayConfig, ScenarioReplay};
pub use types::{
    Card, CardId, CardTier, CreditProfile, LedgerError, Money, TransactionKind,
    TransactionRecord, WalletStatus,
};
