//! Error types for the spend-card engine
//!
//! This module defines every error a session operation or a scenario replay can
//! produce. Business-rule rejections are ordinary values of [`LedgerError`]
//! returned through `Result`; nothing in the stores panics or throws.
//!
//! # Error Categories
//!
//! - **Validation**: malformed amounts, unknown tiers, deposits outside a tier range
//! - **Lookup**: unknown card or redemption option
//! - **Business rules**: insufficient balance or tokens, inactive cards
//! - **Preconditions**: wallet not connected, rewards not loaded
//! - **Simulation**: injected faults and cancelled simulated calls
//! - **Replay I/O**: file and CSV errors while reading a scenario

use super::card::{CardId, CardTier};
use super::money::Money;
use thiserror::Error;

/// Main error type for the spend-card engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A fetch or mutation required a connected wallet
    #[error("Wallet is not connected")]
    WalletNotConnected,

    /// Amount was zero, negative, or otherwise unusable for the operation
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// The rejected amount
        amount: Money,
        /// Operation that rejected it
        operation: String,
    },

    /// Tier ordinal outside 1..=3
    #[error("Invalid card tier {tier}")]
    InvalidTier {
        /// The rejected ordinal
        tier: u8,
    },

    /// Deposit outside the inclusive range allowed for the tier
    #[error("Deposit {deposit} outside {tier} range {min} - {max}")]
    DepositOutOfRange {
        /// Requested tier
        tier: CardTier,
        /// Requested deposit
        deposit: Money,
        /// Lowest deposit the tier accepts
        min: Money,
        /// Highest deposit the tier accepts
        max: Money,
    },

    /// No card with the given id exists in the session
    #[error("Card {card} not found")]
    CardNotFound {
        /// The unknown card id
        card: CardId,
    },

    /// Card has been deactivated
    #[error("Card {card} is not active")]
    CardInactive {
        /// Card id
        card: CardId,
    },

    /// Card has been blacklisted
    #[error("Card {card} is blacklisted")]
    CardBlacklisted {
        /// Card id
        card: CardId,
    },

    /// Spend larger than the card's remaining balance
    #[error("Insufficient balance on card {card}: remaining {remaining}, requested {requested}")]
    InsufficientBalance {
        /// Card id
        card: CardId,
        /// Remaining balance at the time of the check
        remaining: Money,
        /// Requested spend
        requested: Money,
    },

    /// Repayment larger than what is owed on the card
    #[error("Repayment of {requested} on card {card} exceeds outstanding {outstanding}")]
    RepaymentExceedsOutstanding {
        /// Card id
        card: CardId,
        /// Amount owed at the time of the check
        outstanding: Money,
        /// Requested repayment
        requested: Money,
    },

    /// Rewards were never fetched for this session
    #[error("No reward balance found")]
    RewardsUnavailable,

    /// Redemption option id not present in the catalog
    #[error("Invalid redemption option '{option}'")]
    InvalidRedemptionOption {
        /// The unknown option id
        option: String,
    },

    /// Redemption option exists but is switched off
    #[error("Redemption option '{option}' is not available")]
    RedemptionUnavailable {
        /// Option id
        option: String,
    },

    /// Token balance below the option's cost
    #[error("Insufficient CT tokens: available {available}, required {required}")]
    InsufficientTokens {
        /// Tokens held
        available: u64,
        /// Tokens the option costs
        required: u64,
    },

    /// Failure injected through the session's fault injector
    #[error("Simulated failure in {operation}")]
    SimulatedFailure {
        /// Operation that was armed to fail
        operation: String,
    },

    /// The session scope was torn down while the call was in flight
    #[error("{operation} cancelled before completion")]
    Cancelled {
        /// Operation that was cancelled
        operation: String,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// I/O error while reading a scenario or writing output
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Scenario CSV could not be parsed
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Scenario row parsed but does not describe a valid command
    #[error("Invalid command '{op}': {reason}")]
    InvalidCommand {
        /// The command verb as written
        op: String,
        /// What was wrong with it
        reason: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    pub fn invalid_amount(amount: Money, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    pub fn card_not_found(card: CardId) -> Self {
        LedgerError::CardNotFound { card }
    }

    pub fn insufficient_balance(card: CardId, remaining: Money, requested: Money) -> Self {
        LedgerError::InsufficientBalance {
            card,
            remaining,
            requested,
        }
    }

    pub fn repayment_exceeds_outstanding(
        card: CardId,
        outstanding: Money,
        requested: Money,
    ) -> Self {
        LedgerError::RepaymentExceedsOutstanding {
            card,
            outstanding,
            requested,
        }
    }

    pub fn invalid_redemption_option(option: &str) -> Self {
        LedgerError::InvalidRedemptionOption {
            option: option.to_string(),
        }
    }

    pub fn redemption_unavailable(option: &str) -> Self {
        LedgerError::RedemptionUnavailable {
            option: option.to_string(),
        }
    }

    pub fn insufficient_tokens(available: u64, required: u64) -> Self {
        LedgerError::InsufficientTokens {
            available,
            required,
        }
    }

    pub fn simulated_failure(operation: &str) -> Self {
        LedgerError::SimulatedFailure {
            operation: operation.to_string(),
        }
    }

    pub fn cancelled(operation: &str) -> Self {
        LedgerError::Cancelled {
            operation: operation.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    pub fn invalid_command(op: &str, reason: &str) -> Self {
        LedgerError::InvalidCommand {
            op: op.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::wallet(LedgerError::WalletNotConnected, "Wallet is not connected")]
    #[case::invalid_amount(
        LedgerError::invalid_amount(Money::rupees(-5), "spend"),
        "Invalid amount -₹5 for spend"
    )]
    #[case::deposit_range(
        LedgerError::DepositOutOfRange {
            tier: CardTier::Starter,
            deposit: Money::rupees(500),
            min: Money::rupees(1000),
            max: Money::rupees(5000),
        },
        "Deposit ₹500 outside Starter range ₹1,000 - ₹5,000"
    )]
    #[case::insufficient_balance(
        LedgerError::insufficient_balance(1, Money::rupees(1700), Money::rupees(2000)),
        "Insufficient balance on card 1: remaining ₹1,700, requested ₹2,000"
    )]
    #[case::rewards(LedgerError::RewardsUnavailable, "No reward balance found")]
    #[case::invalid_option(
        LedgerError::invalid_redemption_option("redeem_999"),
        "Invalid redemption option 'redeem_999'"
    )]
    #[case::tokens(
        LedgerError::insufficient_tokens(50, 100),
        "Insufficient CT tokens: available 50, required 100"
    )]
    #[case::parse_with_line(
        LedgerError::ParseError { line: Some(7), message: "bad field".to_string() },
        "CSV parse error at line 7: bad field"
    )]
    #[case::parse_without_line(
        LedgerError::ParseError { line: None, message: "bad field".to_string() },
        "CSV parse error: bad field"
    )]
    #[case::cancelled(LedgerError::cancelled("spend"), "spend cancelled before completion")]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::card_not_found(LedgerError::card_not_found(9), LedgerError::CardNotFound { card: 9 })]
    #[case::simulated(
        LedgerError::simulated_failure("mint"),
        LedgerError::SimulatedFailure { operation: "mint".to_string() }
    )]
    #[case::command(
        LedgerError::invalid_command("teleport", "unknown operation"),
        LedgerError::InvalidCommand { op: "teleport".to_string(), reason: "unknown operation".to_string() }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing scenario");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: missing scenario");
    }
}
