//! Scenario replay
//!
//! Drives a [`Session`] from a scripted CSV scenario and writes the final card
//! state. This is what the `spend-card` binary runs.
//!
//! # Architecture
//!
//! ```text
//! ScenarioReplay
//!     ├── ReplayConfig (batch_size, worker_threads, account)
//!     ├── AsyncReader (batch CSV reading)
//!     └── Session (stores, wallet channel, flows)
//! ```
//!
//! Commands are applied strictly in file order, one at a time. Batching only
//! bounds how many parsed rows are held in memory. A rejected command is logged
//! and counted, and the replay moves on to the next one.

use crate::core::{Session, SessionConfig, SystemClock};
use crate::io::async_reader::{AsyncReader, ScenarioStep};
use crate::io::csv_format::{SessionCommand, write_cards_csv};
use crate::types::{LedgerError, WalletStatus};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info, warn};

/// Account used by `connect` rows that do not name one
pub const DEFAULT_ACCOUNT: &str = "0xdemo";

/// Configuration for scenario replay
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayConfig {
    /// Number of scenario rows read per batch
    pub batch_size: usize,
    /// Tokio worker threads
    pub worker_threads: usize,
    /// Wallet connected before the first row, if any
    pub account: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            worker_threads: num_cpus::get(),
            account: None,
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                default = default.worker_threads,
                "invalid worker thread count, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
            account: None,
        }
    }

    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }
}

/// Counts of what a replay did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    /// Rows that never became commands
    pub skipped: usize,
}

/// Replays scenario files against fresh sessions
#[derive(Debug, Clone)]
pub struct ScenarioReplay {
    config: ReplayConfig,
    session_config: SessionConfig,
}

impl ScenarioReplay {
    pub fn new(config: ReplayConfig, session_config: SessionConfig) -> Self {
        Self {
            config,
            session_config,
        }
    }

    /// Replay `input_path` and write the final cards to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` - The scenario ran to the end; rejected commands are counted
    /// * `Err(LedgerError)` - The runtime could not start, the file could not be
    ///   opened, or the output could not be written
    pub fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_all()
            .build()?;

        runtime.block_on(self.run(input_path, output))
    }

    /// Async body of [`ScenarioReplay::process`] for callers already inside a runtime
    pub async fn run(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let file = tokio::fs::File::open(input_path)
            .await
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to open file '{}': {}", input_path.display(), e),
            })?;
        let mut reader = AsyncReader::new(file.compat());

        let initial = match &self.config.account {
            Some(account) => WalletStatus::connected(account.clone()),
            None => WalletStatus::disconnected(),
        };
        let (wallet, wallet_rx) = watch::channel(initial);
        let session = Session::new(self.session_config.clone(), wallet_rx, Arc::new(SystemClock));

        let mut summary = ReplaySummary::default();
        loop {
            let batch = reader.read_batch(self.config.batch_size).await;
            if batch.is_empty() {
                break;
            }

            for step in batch {
                match apply_step(&session, &wallet, &step).await {
                    Ok(()) => summary.applied += 1,
                    Err(error) => {
                        warn!(line = step.line, %error, "command rejected");
                        summary.rejected += 1;
                    }
                }
            }
        }
        summary.skipped = reader.skipped();

        session.close();
        write_cards_csv(&session.cards().snapshot(), output)?;

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "scenario replayed"
        );
        Ok(summary)
    }
}

async fn apply_step(
    session: &Session,
    wallet: &watch::Sender<WalletStatus>,
    step: &ScenarioStep,
) -> Result<(), LedgerError> {
    debug!(line = step.line, command = ?step.command, "applying command");

    match &step.command {
        SessionCommand::Connect { account } => {
            let account = account.as_deref().unwrap_or(DEFAULT_ACCOUNT);
            wallet.send_replace(WalletStatus::connected(account));
            session.sync_wallet().await?;
        }
        SessionCommand::Disconnect => {
            wallet.send_replace(WalletStatus::disconnected());
            session.sync_wallet().await?;
        }
        SessionCommand::Fetch => {
            session.refresh().await?;
        }
        SessionCommand::Mint { deposit, tier } => {
            session.complete_mint(*deposit, *tier).await?;
        }
        SessionCommand::Spend {
            card,
            amount,
            merchant,
        } => {
            session.complete_spend(*card, *amount, merchant).await?;
        }
        SessionCommand::Repay {
            card,
            plan,
            on_time,
        } => {
            session.complete_repayment(*card, *plan, *on_time).await?;
        }
        SessionCommand::Cashback { amount, source } => {
            let transaction_id = session
                .transactions()
                .latest()
                .map(|tx| tx.id)
                .unwrap_or_default();
            if session
                .rewards()
                .earn_cashback(*amount, source, &transaction_id)?
                .is_none()
            {
                return Err(LedgerError::RewardsUnavailable);
            }
        }
        SessionCommand::Redeem { option } => {
            session.rewards().redeem(option).await?;
        }
    }
    Ok(())
}
