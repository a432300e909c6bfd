//! Builders shared by the store tests

use crate::core::config::SessionConfig;
use crate::core::context::StoreContext;
use crate::core::seed::MockLedger;
use crate::core::traits::ManualClock;
use crate::types::WalletStatus;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::watch;

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
}

pub fn context_with(
    config: SessionConfig,
    wallet: WalletStatus,
    ledger: MockLedger,
) -> (watch::Sender<WalletStatus>, StoreContext) {
    let (tx, rx) = watch::channel(wallet);
    let ctx = StoreContext::new(
        config,
        rx,
        Arc::new(ManualClock::new(test_now())),
        Arc::new(ledger),
    );
    (tx, ctx)
}

pub fn connected_context(config: SessionConfig) -> (watch::Sender<WalletStatus>, StoreContext) {
    context_with(
        config,
        WalletStatus::connected("0xabc"),
        MockLedger::seeded(),
    )
}
