//! Wallet connection status
//!
//! The engine never owns the wallet. It observes a [`WalletStatus`] published by
//! whatever holds the connection and gates every fetch on it.

use serde::{Deserialize, Serialize};

/// Snapshot of the wallet connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub is_connected: bool,
    /// Connected account address
    pub account: Option<String>,
}

impl WalletStatus {
    pub fn connected(account: impl Into<String>) -> Self {
        Self {
            is_connected: true,
            account: Some(account.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// The account, if the wallet counts as connected
    ///
    /// Both the flag and an account are required.
    pub fn active_account(&self) -> Option<&str> {
        if self.is_connected {
            self.account.as_deref()
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_account().is_some()
    }
}
