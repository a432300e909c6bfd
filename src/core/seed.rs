//! Mock ledger data a session starts from
//!
//! [`MockLedger::seeded`] holds the demo cards, history, credit profile and
//! rewards catalog. The same data is served for every account. Fields are public so
//! tests can tweak individual figures before handing the ledger to a session.

use crate::core::traits::LedgerSource;
use crate::types::{
    Card, CardTier, CashbackEntry, CreditProfile, CreditScore, FactorBreakdown, LoyaltyTier,
    Money, RedemptionKind, RedemptionOption, ReferralSummary, RewardBalance, RewardsSnapshot,
    ScorePoint, TransactionKind, TransactionRecord, TransactionStatus,
};
use chrono::{DateTime, NaiveDate, Utc};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    date(year, month, day)
        .and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockLedger {
    pub cards: Vec<Card>,
    /// Newest first
    pub transactions: Vec<TransactionRecord>,
    pub credit_profile: CreditProfile,
    pub rewards: RewardsSnapshot,
    pub referral: ReferralSummary,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::seeded()
    }
}

impl MockLedger {
    pub fn seeded() -> Self {
        Self {
            cards: seed_cards(),
            transactions: seed_transactions(),
            credit_profile: seed_credit_profile(),
            rewards: seed_rewards(),
            referral: ReferralSummary {
                referral_count: 3,
                total_earned: Money::rupees(450),
                pending_rewards: Money::rupees(150),
            },
        }
    }

    /// Seeded profile and rewards, but no cards or history
    pub fn without_cards() -> Self {
        Self {
            cards: Vec::new(),
            transactions: Vec::new(),
            ..Self::seeded()
        }
    }
}

impl LedgerSource for MockLedger {
    fn cards(&self, _account: &str) -> Vec<Card> {
        self.cards.clone()
    }

    fn transactions(&self, _account: &str) -> Vec<TransactionRecord> {
        self.transactions.clone()
    }

    fn credit_profile(&self, _account: &str) -> CreditProfile {
        self.credit_profile.clone()
    }

    fn rewards(&self, _account: &str) -> RewardsSnapshot {
        self.rewards.clone()
    }

    fn referral_summary(&self, _account: &str) -> ReferralSummary {
        self.referral.clone()
    }
}

fn seed_card(
    id: u32,
    tier: CardTier,
    deposit: i64,
    remaining: i64,
    validity: NaiveDate,
    minted: DateTime<Utc>,
) -> Card {
    Card {
        id,
        tier,
        deposit_amount: Money::rupees(deposit),
        spending_limit: Money::rupees(deposit * 2),
        remaining_balance: Money::rupees(remaining),
        validity_period: validity,
        mint_timestamp: minted,
        is_active: true,
        is_blacklisted: false,
    }
}

fn seed_cards() -> Vec<Card> {
    vec![
        seed_card(
            1,
            CardTier::Premium,
            10_000,
            15_400,
            date(2025, 12, 31),
            at(2024, 1, 15, 0, 0),
        ),
        seed_card(
            2,
            CardTier::Standard,
            5_000,
            7_200,
            date(2024, 8, 31),
            at(2024, 1, 10, 0, 0),
        ),
        seed_card(
            3,
            CardTier::Starter,
            2_500,
            1_980,
            date(2025, 3, 31),
            at(2024, 1, 20, 0, 0),
        ),
    ]
}

struct SeedTx {
    id: &'static str,
    card_id: u32,
    card_name: &'static str,
    kind: TransactionKind,
    amount: i64,
    merchant: Option<&'static str>,
    category: &'static str,
    timestamp: DateTime<Utc>,
    description: &'static str,
}

impl From<SeedTx> for TransactionRecord {
    fn from(seed: SeedTx) -> Self {
        TransactionRecord {
            id: seed.id.to_string(),
            card_id: seed.card_id,
            card_name: seed.card_name.to_string(),
            kind: seed.kind,
            amount: Money::rupees(seed.amount),
            merchant: seed.merchant.map(str::to_string),
            category: seed.category.to_string(),
            timestamp: seed.timestamp,
            status: TransactionStatus::Completed,
            description: seed.description.to_string(),
        }
    }
}

fn seed_transactions() -> Vec<TransactionRecord> {
    vec![
        SeedTx {
            id: "tx_001",
            card_id: 1,
            card_name: "Premium Card",
            kind: TransactionKind::Spend,
            amount: 2500,
            merchant: Some("Swiggy"),
            category: "Food & Dining",
            timestamp: at(2024, 1, 15, 14, 30),
            description: "Food order from Swiggy",
        },
        SeedTx {
            id: "tx_002",
            card_id: 1,
            card_name: "Premium Card",
            kind: TransactionKind::Repayment,
            amount: 1250,
            merchant: None,
            category: "Repayment",
            timestamp: at(2024, 1, 14, 10, 15),
            description: "Monthly EMI payment",
        },
        SeedTx {
            id: "tx_003",
            card_id: 2,
            card_name: "Standard Card",
            kind: TransactionKind::Spend,
            amount: 850,
            merchant: Some("Amazon"),
            category: "Shopping",
            timestamp: at(2024, 1, 13, 16, 45),
            description: "Online shopping",
        },
        SeedTx {
            id: "tx_004",
            card_id: 1,
            card_name: "Premium Card",
            kind: TransactionKind::Cashback,
            amount: 125,
            merchant: None,
            category: "Rewards",
            timestamp: at(2024, 1, 12, 12, 0),
            description: "Cashback reward",
        },
        SeedTx {
            id: "tx_005",
            card_id: 3,
            card_name: "Starter Card",
            kind: TransactionKind::Mint,
            amount: 5000,
            merchant: None,
            category: "Card Mint",
            timestamp: at(2024, 1, 10, 9, 30),
            description: "New card minted",
        },
    ]
    .into_iter()
    .map(TransactionRecord::from)
    .collect()
}

fn seed_credit_profile() -> CreditProfile {
    let history = [650, 668, 685, 701, 718, 735, 742];
    let score_history = history
        .iter()
        .enumerate()
        .map(|(month, score)| ScorePoint {
            label: format!("2024-{:02}", month + 1),
            score: CreditScore::new(*score),
        })
        .collect();

    CreditProfile {
        score: CreditScore::new(742),
        total_transactions: 156,
        on_time_payments: 142,
        late_payments: 14,
        defaults: 0,
        total_spent: Money::rupees(245_600),
        avg_repayment_days: 12,
        last_updated: at(2024, 7, 31, 0, 0),
        score_history,
        factor_breakdown: FactorBreakdown {
            repayment_history: 85,
            transaction_volume: 78,
            merchant_diversity: 92,
            account_age: 67,
        },
    }
}

fn redemption(
    id: &str,
    kind: RedemptionKind,
    title: &str,
    description: &str,
    cost_in_ct: u64,
) -> RedemptionOption {
    RedemptionOption {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        description: description.to_string(),
        cost_in_ct,
        value: Money::rupees(cost_in_ct as i64),
        available: true,
    }
}

fn cashback(id: &str, amount: i64, source: &str, date: DateTime<Utc>, tx: &str) -> CashbackEntry {
    CashbackEntry {
        id: id.to_string(),
        amount: Money::rupees(amount),
        source: source.to_string(),
        date,
        transaction_id: tx.to_string(),
    }
}

fn seed_rewards() -> RewardsSnapshot {
    RewardsSnapshot {
        balance: RewardBalance {
            ct_tokens: 1247,
            cashback_earned: Money::rupees(3420),
            total_redeemed: Money::rupees(1850),
            loyalty_tier: LoyaltyTier::Silver,
            next_tier_progress: 68,
        },
        cashback_history: vec![
            cashback(
                "cb_001",
                125,
                "Swiggy Purchase",
                at(2024, 1, 15, 14, 30),
                "tx_001",
            ),
            cashback(
                "cb_002",
                85,
                "Amazon Shopping",
                at(2024, 1, 13, 16, 45),
                "tx_003",
            ),
            cashback(
                "cb_003",
                200,
                "Monthly Bonus",
                at(2024, 1, 1, 0, 0),
                "bonus_001",
            ),
        ],
        redemption_options: vec![
            redemption(
                "redeem_001",
                RedemptionKind::Crypto,
                "USDT",
                "Redeem for USDT stablecoin",
                100,
            ),
            redemption(
                "redeem_002",
                RedemptionKind::Voucher,
                "Amazon Voucher",
                "₹500 Amazon gift voucher",
                500,
            ),
            redemption(
                "redeem_003",
                RedemptionKind::Voucher,
                "Swiggy Voucher",
                "₹200 Swiggy food voucher",
                200,
            ),
            redemption(
                "redeem_004",
                RedemptionKind::Cashback,
                "Direct Cashback",
                "Transfer to wallet as cashback",
                150,
            ),
        ],
    }
}
