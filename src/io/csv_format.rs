//! CSV format handling for scenario commands and card output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CommandRecord structure for deserialization
//! - Conversion from command records to session commands
//! - Card output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Card, CardId, CardTier, LedgerError, Money, RepaymentPlan};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the scenario format with columns:
/// op, card, amount, tier, merchant, option, on_time, account.
/// Every column but `op` is optional; which ones are required depends on the op.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CommandRecord {
    pub op: String,
    pub card: Option<CardId>,
    pub amount: Option<String>,
    pub tier: Option<u8>,
    pub merchant: Option<String>,
    pub option: Option<String>,
    pub on_time: Option<String>,
    pub account: Option<String>,
}

/// One step of a scripted session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Connect the wallet; `None` uses the replay's default account
    Connect { account: Option<String> },
    Disconnect,
    /// Fetch every store
    Fetch,
    Mint {
        deposit: Money,
        tier: CardTier,
    },
    Spend {
        card: CardId,
        amount: Money,
        merchant: String,
    },
    Repay {
        card: CardId,
        plan: RepaymentPlan,
        on_time: bool,
    },
    /// Cashback credited against the most recent transaction
    Cashback {
        amount: Money,
        source: String,
    },
    Redeem {
        option: String,
    },
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_amount(op: &str, field: Option<String>) -> Result<Money, LedgerError> {
    let raw = non_empty(field).ok_or_else(|| LedgerError::invalid_command(op, "missing amount"))?;
    Decimal::from_str(&raw)
        .map(Money::new)
        .map_err(|_| LedgerError::invalid_command(op, &format!("invalid amount '{}'", raw)))
}

fn parse_plan(op: &str, field: Option<String>) -> Result<RepaymentPlan, LedgerError> {
    let raw = non_empty(field).ok_or_else(|| LedgerError::invalid_command(op, "missing amount"))?;
    match raw.to_lowercase().as_str() {
        "full" => Ok(RepaymentPlan::Full),
        "half" => Ok(RepaymentPlan::Half),
        "minimum" | "min" => Ok(RepaymentPlan::Minimum),
        _ => parse_amount(op, Some(raw)).map(RepaymentPlan::Custom),
    }
}

fn parse_on_time(op: &str, field: Option<String>) -> Result<bool, LedgerError> {
    match non_empty(field).map(|value| value.to_lowercase()).as_deref() {
        None | Some("true") | Some("yes") | Some("1") => Ok(true),
        Some("false") | Some("no") | Some("0") => Ok(false),
        Some(other) => Err(LedgerError::invalid_command(
            op,
            &format!("invalid on_time '{}'", other),
        )),
    }
}

fn require_card(op: &str, card: Option<CardId>) -> Result<CardId, LedgerError> {
    card.ok_or_else(|| LedgerError::invalid_command(op, "missing card"))
}

/// Convert a CommandRecord to a SessionCommand
///
/// This function:
/// - Parses the op (case-insensitive) into a command
/// - Parses amounts into `Money`, and repay amounts into a `RepaymentPlan`
///   (`full`, `half`, `minimum` or a number)
/// - Validates that the columns the op needs are present
pub fn convert_command_record(record: CommandRecord) -> Result<SessionCommand, LedgerError> {
    let op = record.op.trim().to_lowercase();

    match op.as_str() {
        "connect" => Ok(SessionCommand::Connect {
            account: non_empty(record.account),
        }),
        "disconnect" => Ok(SessionCommand::Disconnect),
        "fetch" => Ok(SessionCommand::Fetch),
        "mint" => {
            let tier = record
                .tier
                .ok_or_else(|| LedgerError::invalid_command(&op, "missing tier"))?;
            Ok(SessionCommand::Mint {
                deposit: parse_amount(&op, record.amount)?,
                tier: CardTier::from_ordinal(tier)?,
            })
        }
        "spend" => Ok(SessionCommand::Spend {
            card: require_card(&op, record.card)?,
            amount: parse_amount(&op, record.amount)?,
            merchant: non_empty(record.merchant)
                .ok_or_else(|| LedgerError::invalid_command(&op, "missing merchant"))?,
        }),
        "repay" => Ok(SessionCommand::Repay {
            card: require_card(&op, record.card)?,
            plan: parse_plan(&op, record.amount)?,
            on_time: parse_on_time(&op, record.on_time)?,
        }),
        "cashback" => Ok(SessionCommand::Cashback {
            amount: parse_amount(&op, record.amount)?,
            source: non_empty(record.merchant).unwrap_or_else(|| "Cashback".to_string()),
        }),
        "redeem" => Ok(SessionCommand::Redeem {
            option: non_empty(record.option)
                .ok_or_else(|| LedgerError::invalid_command(&op, "missing option"))?,
        }),
        _ => Err(LedgerError::invalid_command(&record.op, "unknown operation")),
    }
}

/// Write card states to CSV format
///
/// Writes cards with columns:
/// id, name, tier, deposit, spending_limit, remaining_balance, outstanding, active.
/// Cards are sorted by id for deterministic output and amounts use two decimals.
pub fn write_cards_csv(cards: &[Card], output: &mut dyn Write) -> Result<(), LedgerError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer.write_record([
        "id",
        "name",
        "tier",
        "deposit",
        "spending_limit",
        "remaining_balance",
        "outstanding",
        "active",
    ])?;

    let mut sorted_cards = cards.to_vec();
    sorted_cards.sort_by_key(|card| card.id);

    for card in sorted_cards {
        writer.write_record(&[
            card.id.to_string(),
            card.name(),
            card.tier.label().to_string(),
            format!("{:.2}", card.deposit_amount.amount()),
            format!("{:.2}", card.spending_limit.amount()),
            format!("{:.2}", card.remaining_balance.amount()),
            format!("{:.2}", card.outstanding().amount()),
            (card.is_active && !card.is_blacklisted).to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::seed::MockLedger;
    use rstest::rstest;

    fn record(op: &str) -> CommandRecord {
        CommandRecord {
            op: op.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("connect", SessionCommand::Connect { account: None })]
    #[case("DISCONNECT", SessionCommand::Disconnect)]
    #[case(" fetch ", SessionCommand::Fetch)]
    fn test_convert_bare_commands(#[case] op: &str, #[case] expected: SessionCommand) {
        assert_eq!(convert_command_record(record(op)).unwrap(), expected);
    }

    #[test]
    fn test_convert_connect_with_account() {
        let command = convert_command_record(CommandRecord {
            account: Some("0xabc".to_string()),
            ..record("connect")
        })
        .unwrap();
        assert_eq!(
            command,
            SessionCommand::Connect {
                account: Some("0xabc".to_string())
            }
        );
    }

    #[test]
    fn test_convert_mint() {
        let command = convert_command_record(CommandRecord {
            amount: Some("1000".to_string()),
            tier: Some(1),
            ..record("mint")
        })
        .unwrap();
        assert_eq!(
            command,
            SessionCommand::Mint {
                deposit: Money::rupees(1000),
                tier: CardTier::Starter
            }
        );
    }

    #[test]
    fn test_convert_spend_rounds_to_paise() {
        let command = convert_command_record(CommandRecord {
            card: Some(2),
            amount: Some(" 99.999 ".to_string()),
            merchant: Some("Amazon".to_string()),
            ..record("spend")
        })
        .unwrap();
        assert_eq!(
            command,
            SessionCommand::Spend {
                card: 2,
                amount: Money::rupees(100),
                merchant: "Amazon".to_string()
            }
        );
    }

    #[rstest]
    #[case("full", None, RepaymentPlan::Full, true)]
    #[case("Half", Some("no"), RepaymentPlan::Half, false)]
    #[case("minimum", Some("true"), RepaymentPlan::Minimum, true)]
    #[case("250.50", Some("0"), RepaymentPlan::Custom(Money::from_paise(25_050)), false)]
    fn test_convert_repay(
        #[case] amount: &str,
        #[case] on_time: Option<&str>,
        #[case] plan: RepaymentPlan,
        #[case] expected_on_time: bool,
    ) {
        let command = convert_command_record(CommandRecord {
            card: Some(1),
            amount: Some(amount.to_string()),
            on_time: on_time.map(str::to_string),
            ..record("repay")
        })
        .unwrap();
        assert_eq!(
            command,
            SessionCommand::Repay {
                card: 1,
                plan,
                on_time: expected_on_time
            }
        );
    }

    #[test]
    fn test_convert_cashback_default_source() {
        let command = convert_command_record(CommandRecord {
            amount: Some("125".to_string()),
            ..record("cashback")
        })
        .unwrap();
        assert_eq!(
            command,
            SessionCommand::Cashback {
                amount: Money::rupees(125),
                source: "Cashback".to_string()
            }
        );
    }

    #[rstest]
    #[case::unknown_op(record("teleport"), "unknown operation")]
    #[case::mint_missing_tier(
        CommandRecord { amount: Some("1000".to_string()), ..record("mint") },
        "missing tier"
    )]
    #[case::spend_missing_card(
        CommandRecord { amount: Some("10".to_string()), merchant: Some("Uber".to_string()), ..record("spend") },
        "missing card"
    )]
    #[case::spend_bad_amount(
        CommandRecord { card: Some(1), amount: Some("lots".to_string()), merchant: Some("Uber".to_string()), ..record("spend") },
        "invalid amount 'lots'"
    )]
    #[case::spend_missing_merchant(
        CommandRecord { card: Some(1), amount: Some("10".to_string()), merchant: Some("  ".to_string()), ..record("spend") },
        "missing merchant"
    )]
    #[case::repay_bad_on_time(
        CommandRecord { card: Some(1), amount: Some("full".to_string()), on_time: Some("maybe".to_string()), ..record("repay") },
        "invalid on_time 'maybe'"
    )]
    #[case::redeem_missing_option(record("redeem"), "missing option")]
    fn test_convert_errors(#[case] record: CommandRecord, #[case] expected: &str) {
        let error = convert_command_record(record).unwrap_err();
        assert!(
            error.to_string().contains(expected),
            "expected '{}' in '{}'",
            expected,
            error
        );
    }

    #[test]
    fn test_convert_rejects_unknown_tier() {
        let result = convert_command_record(CommandRecord {
            amount: Some("1000".to_string()),
            tier: Some(4),
            ..record("mint")
        });
        assert_eq!(result, Err(LedgerError::InvalidTier { tier: 4 }));
    }

    #[test]
    fn test_write_cards_csv_sorted_by_id() {
        let mut cards = MockLedger::seeded().cards;
        cards.reverse();
        cards[0].is_active = false;

        let mut output = Vec::new();
        write_cards_csv(&cards, &mut output).unwrap();

        let expected = "id,name,tier,deposit,spending_limit,remaining_balance,outstanding,active\n\
            1,Premium Card,Premium,10000.00,20000.00,15400.00,4600.00,true\n\
            2,Standard Card,Standard,5000.00,10000.00,7200.00,2800.00,true\n\
            3,Starter Card,Starter,2500.00,5000.00,1980.00,3020.00,false\n";
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_write_cards_csv_empty() {
        let mut output = Vec::new();
        write_cards_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,name,tier,deposit,spending_limit,remaining_balance,outstanding,active\n"
        );
    }
}
