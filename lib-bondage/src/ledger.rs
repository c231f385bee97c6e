//! Bonding Ledger
//!
//! Dot accounting for every (subscriber, provider, specifier) key:
//! bound balance, escrow balance, and the per-curve issued counter.
//!
//! # Invariants
//! - Balances never go negative (all arithmetic is checked)
//! - For every curve: issued == Σ (bound + escrow) over its holders
//! - Escrow and release only move dots between keys; they never change issuance
//!
//! Mutations that can fail are split into `prepare_*` (validate, no writes)
//! and [`BondingLedger::commit`], so the service can run its token transfer
//! between the two and keep the whole operation all-or-nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use lib_types::{Address, DotCount, Specifier};

use crate::errors::{BondageError, BondageResult};

/// Curve identity: one provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveKey {
    pub provider: Address,
    pub specifier: Specifier,
}

impl CurveKey {
    pub fn new(provider: Address, specifier: Specifier) -> Self {
        Self { provider, specifier }
    }
}

/// Holder identity: a subscriber's position on one curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondKey {
    pub subscriber: Address,
    pub provider: Address,
    pub specifier: Specifier,
}

impl BondKey {
    pub fn new(subscriber: Address, provider: Address, specifier: Specifier) -> Self {
        Self {
            subscriber,
            provider,
            specifier,
        }
    }

    pub fn curve(&self) -> CurveKey {
        CurveKey::new(self.provider, self.specifier)
    }

    /// Same curve, different holder
    pub fn with_subscriber(&self, subscriber: Address) -> Self {
        Self { subscriber, ..*self }
    }
}

/// A validated balance change, applied with [`BondingLedger::commit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a prepared update does nothing until committed"]
pub struct LedgerUpdate {
    key: BondKey,
    bound: DotCount,
    issued: DotCount,
}

impl LedgerUpdate {
    pub fn key(&self) -> &BondKey {
        &self.key
    }

    /// Issued count the curve will have after the commit
    pub fn issued_after(&self) -> DotCount {
        self.issued
    }
}

/// Dot balances, escrow and issuance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BondingLedger {
    bound: HashMap<BondKey, DotCount>,
    escrow: HashMap<BondKey, DotCount>,
    issued: HashMap<CurveKey, DotCount>,
}

impl BondingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads (never fail, unknown keys are zero)
    // =========================================================================

    pub fn bound_dots(&self, key: &BondKey) -> DotCount {
        self.bound.get(key).copied().unwrap_or(0)
    }

    pub fn escrowed_dots(&self, key: &BondKey) -> DotCount {
        self.escrow.get(key).copied().unwrap_or(0)
    }

    pub fn dots_issued(&self, curve: &CurveKey) -> DotCount {
        self.issued.get(curve).copied().unwrap_or(0)
    }

    // =========================================================================
    // Bond / unbond
    // =========================================================================

    /// Validate crediting `dots` newly issued dots to `key`
    pub fn prepare_credit(&self, key: &BondKey, dots: DotCount) -> BondageResult<LedgerUpdate> {
        let bound = self
            .bound_dots(key)
            .checked_add(dots)
            .ok_or(BondageError::Overflow)?;
        let issued = self
            .dots_issued(&key.curve())
            .checked_add(dots)
            .ok_or(BondageError::Overflow)?;
        Ok(LedgerUpdate { key: *key, bound, issued })
    }

    /// Validate removing `dots` from `key` and from issuance
    pub fn prepare_debit(&self, key: &BondKey, dots: DotCount) -> BondageResult<LedgerUpdate> {
        let have = self.bound_dots(key);
        let bound = have
            .checked_sub(dots)
            .ok_or(BondageError::InsufficientDots { have, need: dots })?;
        let issued = self
            .dots_issued(&key.curve())
            .checked_sub(dots)
            .ok_or(BondageError::Overflow)?;
        Ok(LedgerUpdate { key: *key, bound, issued })
    }

    /// Apply a prepared update
    pub fn commit(&mut self, update: LedgerUpdate) {
        self.bound.insert(update.key, update.bound);
        self.issued.insert(update.key.curve(), update.issued);
    }

    // =========================================================================
    // Escrow
    // =========================================================================

    /// Move `dots` from bound to escrow.
    ///
    /// Returns the dots moved. Asking for more than the bound balance is a
    /// no-op that returns 0.
    pub fn escrow(&mut self, key: &BondKey, dots: DotCount) -> DotCount {
        let bound = self.bound_dots(key);
        if dots == 0 || dots > bound {
            return 0;
        }
        let escrowed = self.escrowed_dots(key);
        let Some(new_escrow) = escrowed.checked_add(dots) else {
            return 0;
        };

        self.bound.insert(*key, bound - dots);
        self.escrow.insert(*key, new_escrow);
        dots
    }

    /// Move up to `dots` of `key`'s escrow to `target`'s bound balance on the
    /// same curve. Requests beyond the escrow are clamped to it.
    ///
    /// Returns the dots released.
    pub fn release(&mut self, key: &BondKey, target: Address, dots: DotCount) -> BondageResult<DotCount> {
        let escrowed = self.escrowed_dots(key);
        let amount = dots.min(escrowed);
        if amount == 0 {
            return Ok(0);
        }

        let target_key = key.with_subscriber(target);
        let target_bound = self
            .bound_dots(&target_key)
            .checked_add(amount)
            .ok_or(BondageError::Overflow)?;

        self.escrow.insert(*key, escrowed - amount);
        self.bound.insert(target_key, target_bound);
        Ok(amount)
    }

    // =========================================================================
    // Conservation
    // =========================================================================

    /// Σ (bound + escrow) over every holder of `curve`
    pub fn held_dots(&self, curve: &CurveKey) -> u128 {
        let bound: u128 = self
            .bound
            .iter()
            .filter(|(k, _)| k.curve() == *curve)
            .map(|(_, v)| *v as u128)
            .sum();
        let escrowed: u128 = self
            .escrow
            .iter()
            .filter(|(k, _)| k.curve() == *curve)
            .map(|(_, v)| *v as u128)
            .sum();
        bound + escrowed
    }

    /// issued == Σ (bound + escrow)
    pub fn conservation_holds(&self, curve: &CurveKey) -> bool {
        self.held_dots(curve) == self.dots_issued(curve) as u128
    }
}
