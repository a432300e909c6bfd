//! Thread-safe card storage for a session
//!
//! This module provides the `CardStore` struct, which owns every card of the
//! connected wallet and applies mint, spend and repay operations against them.
//!
//! # Design
//!
//! Cards live in a `DashMap` keyed by card id. Each mutation first waits out its
//! simulated round trip and only then takes the card's entry lock, re-checks the
//! balance rule and applies the change inside [`CardStore::update`]. Two
//! overlapping spends on one card are therefore serialized, and the second sees
//! the balance the first left behind.
//!
//! # Hydration
//!
//! Seed cards are loaded from the ledger source on the first connected access and
//! never again until the store is reset.

use crate::core::config::RepaymentPolicy;
use crate::core::context::StoreContext;
use crate::core::simulator::Operation;
use crate::types::{Card, CardId, CardTier, LedgerError, Money};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Outcome of a successful mint
#[derive(Debug, Clone, PartialEq)]
pub struct MintReceipt {
    pub card: Card,
}

/// Outcome of a successful spend
#[derive(Debug, Clone, PartialEq)]
pub struct SpendReceipt {
    /// `tx_<millis>` reference for the spend
    pub transaction_id: String,
    pub card_id: CardId,
    pub card_name: String,
    pub amount: Money,
    pub remaining_balance: Money,
}

/// Outcome of a successful repayment
#[derive(Debug, Clone, PartialEq)]
pub struct RepaymentReceipt {
    /// `repay_<millis>` reference for the repayment
    pub transaction_id: String,
    pub card_id: CardId,
    pub card_name: String,
    /// Amount actually credited to the card; less than requested only under
    /// [`RepaymentPolicy::ClampToLimit`]
    pub applied: Money,
    pub remaining_balance: Money,
}

fn ensure_positive(amount: Money, operation: &str) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::invalid_amount(amount, operation))
    }
}

/// Card state of one session
#[derive(Debug)]
pub struct CardStore {
    ctx: StoreContext,

    /// Concurrent map of cards by id
    cards: DashMap<CardId, Card>,

    /// Id handed to the next minted card
    next_id: AtomicU32,

    /// Whether seed cards were loaded for the current account
    hydrated: Mutex<bool>,
}

impl CardStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            cards: DashMap::new(),
            next_id: AtomicU32::new(1),
            hydrated: Mutex::new(false),
        }
    }

    fn hydrate(&self, account: &str) {
        let mut hydrated = self.hydrated.lock().unwrap_or_else(PoisonError::into_inner);
        if *hydrated {
            return;
        }

        for card in self.ctx.ledger.cards(account) {
            self.next_id.fetch_max(card.id.saturating_add(1), Ordering::AcqRel);
            self.cards.entry(card.id).or_insert(card);
        }
        *hydrated = true;
    }

    /// Drop every card and forget hydration
    pub fn reset(&self) {
        let mut hydrated = self.hydrated.lock().unwrap_or_else(PoisonError::into_inner);
        self.cards.clear();
        self.next_id.store(1, Ordering::Release);
        *hydrated = false;
    }

    /// Load the wallet's cards
    ///
    /// # Returns
    ///
    /// * `Ok(cards)` - Every card, ordered by id; empty without a connected wallet
    /// * `Err(LedgerError)` - The simulated call was cancelled or failed
    pub async fn fetch(&self) -> Result<Vec<Card>, LedgerError> {
        let Some(account) = self.ctx.active_account() else {
            return Ok(Vec::new());
        };

        self.ctx.simulator.call(Operation::FetchCards).await?;
        self.hydrate(&account);
        Ok(self.snapshot())
    }

    /// Cards currently held, ordered by id
    pub fn snapshot(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        cards.sort_by_key(|card| card.id);
        cards
    }

    pub fn get(&self, card_id: CardId) -> Option<Card> {
        self.cards.get(&card_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Update a card using a closure
    ///
    /// The closure runs while the card's entry lock is held, so its check and its
    /// change are atomic with respect to every other operation on the same card.
    /// A closure that returns an error must leave the card untouched.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - Whatever the closure returned
    /// * `Err(LedgerError::CardNotFound)` - No card with that id
    /// * `Err(LedgerError)` - The closure's error
    pub fn update<F, T>(&self, card_id: CardId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Card) -> Result<T, LedgerError>,
    {
        match self.cards.get_mut(&card_id) {
            Some(mut entry) => f(entry.value_mut()),
            None => Err(LedgerError::card_not_found(card_id)),
        }
    }

    fn require_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        if self.cards.contains_key(&card_id) {
            Ok(())
        } else {
            Err(LedgerError::card_not_found(card_id))
        }
    }

    /// Mint a new card against `deposit`
    ///
    /// The spending limit and the starting balance are both `deposit × 2`.
    pub async fn mint(&self, deposit: Money, tier: CardTier) -> Result<MintReceipt, LedgerError> {
        let account = self.ctx.require_account()?;
        ensure_positive(deposit, "mint")?;

        let spec = tier.spec();
        if self.ctx.config.enforce_tier_bounds && !spec.accepts(deposit) {
            return Err(LedgerError::DepositOutOfRange {
                tier,
                deposit,
                min: spec.min_deposit,
                max: spec.max_deposit,
            });
        }

        self.ctx.simulator.call(Operation::Mint).await?;
        // The wallet may have moved on while the call was in flight
        if self.ctx.active_account().as_deref() != Some(account.as_str()) {
            return Err(LedgerError::cancelled(Operation::Mint.as_str()));
        }
        self.hydrate(&account);

        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        let card = Card::mint(
            id,
            tier,
            deposit,
            self.ctx.config.mint_validity,
            self.ctx.now(),
        )?;
        self.cards.insert(id, card.clone());

        info!(
            card = id,
            tier = %tier,
            deposit = %deposit,
            spending_limit = %card.spending_limit,
            "card minted"
        );
        Ok(MintReceipt { card })
    }

    /// Spend `amount` at `merchant` on a card
    ///
    /// # Returns
    ///
    /// * `Ok(SpendReceipt)` - The spend was applied
    /// * `Err(LedgerError::InsufficientBalance)` - `amount` exceeds the remaining balance
    /// * `Err(LedgerError::CardInactive | CardBlacklisted)` - The card cannot be used
    pub async fn spend(
        &self,
        card_id: CardId,
        amount: Money,
        merchant: &str,
    ) -> Result<SpendReceipt, LedgerError> {
        self.ctx.require_account()?;
        ensure_positive(amount, "spend")?;
        self.require_card(card_id)?;

        self.ctx.simulator.call(Operation::Spend).await?;

        let (card_name, remaining_balance) = self.update(card_id, |card| {
            card.ensure_usable()?;
            if amount > card.remaining_balance {
                return Err(LedgerError::insufficient_balance(
                    card.id,
                    card.remaining_balance,
                    amount,
                ));
            }
            card.remaining_balance = card
                .remaining_balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("spend"))?;
            Ok((card.name(), card.remaining_balance))
        })?;

        info!(
            card = card_id,
            amount = %amount,
            merchant,
            remaining = %remaining_balance,
            "spend applied"
        );

        Ok(SpendReceipt {
            transaction_id: self.ctx.next_id("tx"),
            card_id,
            card_name,
            amount,
            remaining_balance,
        })
    }

    /// Credit a repayment of `amount` to a card under the session's repayment policy
    pub async fn repay(
        &self,
        card_id: CardId,
        amount: Money,
    ) -> Result<RepaymentReceipt, LedgerError> {
        self.ctx.require_account()?;
        ensure_positive(amount, "repay")?;
        self.require_card(card_id)?;

        self.ctx.simulator.call(Operation::Repay).await?;

        let policy = self.ctx.config.repayment_policy;
        let (card_name, applied, remaining_balance) = self.update(card_id, |card| {
            let outstanding = card.outstanding();
            let applied = match policy {
                RepaymentPolicy::RejectExcess => {
                    if amount > outstanding {
                        return Err(LedgerError::repayment_exceeds_outstanding(
                            card.id,
                            outstanding,
                            amount,
                        ));
                    }
                    amount
                }
                RepaymentPolicy::ClampToLimit => {
                    if outstanding.is_zero() {
                        return Err(LedgerError::invalid_amount(Money::ZERO, "repay"));
                    }
                    amount.min(outstanding)
                }
                RepaymentPolicy::Uncapped => amount,
            };
            card.remaining_balance = card
                .remaining_balance
                .checked_add(applied)
                .ok_or_else(|| LedgerError::arithmetic_overflow("repay"))?;
            Ok((card.name(), applied, card.remaining_balance))
        })?;

        info!(
            card = card_id,
            requested = %amount,
            applied = %applied,
            remaining = %remaining_balance,
            "repayment applied"
        );

        Ok(RepaymentReceipt {
            transaction_id: self.ctx.next_id("repay"),
            card_id,
            card_name,
            applied,
            remaining_balance,
        })
    }

    pub fn set_active(&self, card_id: CardId, active: bool) -> Result<(), LedgerError> {
        self.update(card_id, |card| {
            card.is_active = active;
            Ok(())
        })
    }

    pub fn set_blacklisted(&self, card_id: CardId, blacklisted: bool) -> Result<(), LedgerError> {
        self.update(card_id, |card| {
            card.is_blacklisted = blacklisted;
            Ok(())
        })
    }
}
