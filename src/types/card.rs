//! Card-related types for the spend-card engine
//!
//! A [`Card`] is one virtual spend card minted against a deposit. Its spending
//! limit is fixed at mint time (deposit × tier multiplier) and the remaining
//! balance moves down with spends and up with repayments.

use super::error::LedgerError;
use super::money::Money;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card identifier
///
/// Cards are numbered sequentially within a session, starting at 1.
pub type CardId = u32;

/// Card tier, ordinal 1 to 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardTier {
    Starter,
    Standard,
    Premium,
}

impl CardTier {
    pub const ALL: [CardTier; 3] = [CardTier::Starter, CardTier::Standard, CardTier::Premium];

    /// Resolve a tier from its ordinal
    pub fn from_ordinal(ordinal: u8) -> Result<Self, LedgerError> {
        match ordinal {
            1 => Ok(CardTier::Starter),
            2 => Ok(CardTier::Standard),
            3 => Ok(CardTier::Premium),
            other => Err(LedgerError::InvalidTier { tier: other }),
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            CardTier::Starter => 1,
            CardTier::Standard => 2,
            CardTier::Premium => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardTier::Starter => "Starter",
            CardTier::Standard => "Standard",
            CardTier::Premium => "Premium",
        }
    }

    /// Deposit bounds, multiplier and joining bonus for this tier
    pub fn spec(self) -> TierSpec {
        let (min, max, bonus) = match self {
            CardTier::Starter => (1_000, 5_000, 500),
            CardTier::Standard => (5_000, 15_000, 1_000),
            CardTier::Premium => (15_000, 50_000, 2_000),
        };
        TierSpec {
            tier: self,
            min_deposit: Money::rupees(min),
            max_deposit: Money::rupees(max),
            multiplier: Decimal::TWO,
            joining_bonus: Money::rupees(bonus),
        }
    }
}

impl fmt::Display for CardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mint terms of a tier
#[derive(Debug, Clone, PartialEq)]
pub struct TierSpec {
    pub tier: CardTier,
    /// Lowest accepted deposit (inclusive)
    pub min_deposit: Money,
    /// Highest accepted deposit (inclusive)
    pub max_deposit: Money,
    /// Spending limit = deposit × multiplier
    pub multiplier: Decimal,
    /// One-off bonus shown on the mint quote
    pub joining_bonus: Money,
}

impl TierSpec {
    pub fn accepts(&self, deposit: Money) -> bool {
        deposit >= self.min_deposit && deposit <= self.max_deposit
    }

    /// Totals shown before minting
    pub fn quote(&self, deposit: Money) -> Result<MintQuote, LedgerError> {
        let spending_limit = deposit
            .checked_mul(self.multiplier)
            .ok_or_else(|| LedgerError::arithmetic_overflow("mint quote"))?;
        let total_value = spending_limit
            .checked_add(self.joining_bonus)
            .ok_or_else(|| LedgerError::arithmetic_overflow("mint quote"))?;

        Ok(MintQuote {
            tier: self.tier,
            deposit,
            spending_limit,
            joining_bonus: self.joining_bonus,
            total_value,
        })
    }
}

/// Pre-mint calculation for a deposit at a tier
#[derive(Debug, Clone, PartialEq)]
pub struct MintQuote {
    pub tier: CardTier,
    pub deposit: Money,
    pub spending_limit: Money,
    pub joining_bonus: Money,
    /// Spending limit plus joining bonus
    pub total_value: Money,
}

/// One virtual spend card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique within the session
    pub id: CardId,

    pub tier: CardTier,

    /// Amount locked when the card was minted
    pub deposit_amount: Money,

    /// Deposit × multiplier at mint time; never changes afterwards
    pub spending_limit: Money,

    /// What can still be spent
    pub remaining_balance: Money,

    /// Last day the card is valid
    pub validity_period: NaiveDate,

    pub mint_timestamp: DateTime<Utc>,

    pub is_active: bool,

    pub is_blacklisted: bool,
}

impl Card {
    /// Mint a fresh card: remaining balance starts at the full spending limit
    pub fn mint(
        id: CardId,
        tier: CardTier,
        deposit_amount: Money,
        validity_period: NaiveDate,
        mint_timestamp: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let spending_limit = deposit_amount
            .checked_mul(tier.spec().multiplier)
            .ok_or_else(|| LedgerError::arithmetic_overflow("mint"))?;

        Ok(Card {
            id,
            tier,
            deposit_amount,
            spending_limit,
            remaining_balance: spending_limit,
            validity_period,
            mint_timestamp,
            is_active: true,
            is_blacklisted: false,
        })
    }

    /// Display name, e.g. "Starter Card"
    pub fn name(&self) -> String {
        format!("{} Card", self.tier.label())
    }

    /// Mirror of the remaining balance
    pub fn balance(&self) -> Money {
        self.remaining_balance
    }

    /// Credit limit shown on the card face (same as the spending limit)
    pub fn credit_limit(&self) -> Money {
        self.spending_limit
    }

    /// `MM/YY` label printed on the card
    pub fn expiry_label(&self) -> String {
        self.validity_period.format("%m/%y").to_string()
    }

    /// Amount spent and not yet repaid
    pub fn outstanding(&self) -> Money {
        self.spending_limit.saturating_sub(self.remaining_balance)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.validity_period
    }

    /// Still valid but expiring within `window_days`
    pub fn is_expiring(&self, today: NaiveDate, window_days: i64) -> bool {
        let days_left = (self.validity_period - today).num_days();
        (0..=window_days).contains(&days_left)
    }

    /// Whether the card can take spends at all
    pub fn ensure_usable(&self) -> Result<(), LedgerError> {
        if self.is_blacklisted {
            return Err(LedgerError::CardBlacklisted { card: self.id });
        }
        if !self.is_active {
            return Err(LedgerError::CardInactive { card: self.id });
        }
        Ok(())
    }
}

/// How much of the outstanding amount a repayment covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepaymentPlan {
    /// 10% of the outstanding amount
    Minimum,
    /// Half of the outstanding amount
    Half,
    /// Everything outstanding
    Full,
    /// A caller-chosen amount
    Custom(Money),
}

impl RepaymentPlan {
    /// Resolve the plan to a concrete amount against `outstanding`
    pub fn amount(self, outstanding: Money) -> Money {
        match self {
            RepaymentPlan::Minimum => outstanding
                .checked_mul(Decimal::new(1, 1))
                .unwrap_or(Money::ZERO),
            RepaymentPlan::Half => outstanding
                .checked_mul(Decimal::new(5, 1))
                .unwrap_or(Money::ZERO),
            RepaymentPlan::Full => outstanding,
            RepaymentPlan::Custom(amount) => amount,
        }
    }

    /// Transaction description for a repayment made under this plan
    pub fn description(self) -> &'static str {
        match self {
            RepaymentPlan::Full => "Full payment",
            RepaymentPlan::Minimum => "Minimum payment",
            RepaymentPlan::Half | RepaymentPlan::Custom(_) => "Partial payment",
        }
    }
}
