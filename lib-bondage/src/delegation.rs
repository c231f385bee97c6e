//! Delegation Table
//!
//! A third party may bond once on behalf of a (subscriber, provider) pair.
//! That delegate may later unbond on the subscriber's behalf until the
//! subscriber resets the pair. After a reset the pair accepts a new delegate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use lib_types::Address;

use crate::errors::{BondageError, BondageResult};

/// Delegation state of one (subscriber, provider) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationState {
    NoDelegate,
    Active { delegate: Address },
}

/// Delegation records keyed by (subscriber, provider)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationTable {
    entries: HashMap<(Address, Address), Address>,
}

impl DelegationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, subscriber: &Address, provider: &Address) -> DelegationState {
        match self.entries.get(&(*subscriber, *provider)) {
            Some(delegate) => DelegationState::Active { delegate: *delegate },
            None => DelegationState::NoDelegate,
        }
    }

    pub fn delegate_of(&self, subscriber: &Address, provider: &Address) -> Option<Address> {
        self.entries.get(&(*subscriber, *provider)).copied()
    }

    /// Fails if any delegate already bonded for the pair
    pub fn ensure_can_bond(&self, subscriber: &Address, provider: &Address) -> BondageResult<()> {
        if self.entries.contains_key(&(*subscriber, *provider)) {
            return Err(BondageError::DelegateAlreadyUsed {
                subscriber: *subscriber,
                provider: *provider,
            });
        }
        Ok(())
    }

    /// Record `delegate` after its bond succeeded
    pub fn record_bond(
        &mut self,
        delegate: Address,
        subscriber: Address,
        provider: Address,
    ) -> BondageResult<()> {
        self.ensure_can_bond(&subscriber, &provider)?;
        self.entries.insert((subscriber, provider), delegate);
        Ok(())
    }

    /// `caller` must be the active delegate for the pair
    pub fn authorize_unbond(
        &self,
        caller: &Address,
        subscriber: &Address,
        provider: &Address,
    ) -> BondageResult<()> {
        match self.delegate_of(subscriber, provider) {
            Some(delegate) if delegate == *caller => Ok(()),
            _ => Err(BondageError::NoActiveDelegate {
                caller: *caller,
                subscriber: *subscriber,
                provider: *provider,
            }),
        }
    }

    /// Clear the pair. Returns the delegate that was removed, if any.
    pub fn reset(&mut self, subscriber: &Address, provider: &Address) -> Option<Address> {
        self.entries.remove(&(*subscriber, *provider))
    }
}
