//! Service authority: the owner and the single arbiter allowed to move escrow

use serde::{Deserialize, Serialize};

use lib_types::Address;

use crate::errors::{BondageError, BondageResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityContext {
    owner: Address,
    arbiter: Option<Address>,
}

impl AuthorityContext {
    pub fn new(owner: Address, arbiter: Option<Address>) -> Self {
        Self { owner, arbiter }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn arbiter(&self) -> Option<&Address> {
        self.arbiter.as_ref()
    }

    pub fn require_owner(&self, caller: &Address) -> BondageResult<()> {
        if *caller != self.owner {
            return Err(BondageError::Unauthorized(format!(
                "{:?} is not the service owner",
                caller
            )));
        }
        Ok(())
    }

    pub fn require_arbiter(&self, caller: &Address) -> BondageResult<()> {
        match self.arbiter {
            Some(arbiter) if arbiter == *caller => Ok(()),
            Some(_) => Err(BondageError::Unauthorized(format!(
                "{:?} is not the arbiter",
                caller
            ))),
            None => Err(BondageError::Unauthorized(
                "no arbiter configured".to_string(),
            )),
        }
    }

    /// Owner-only, settable once
    pub fn set_arbiter(&mut self, caller: &Address, arbiter: Address) -> BondageResult<()> {
        self.require_owner(caller)?;
        if self.arbiter.is_some() {
            return Err(BondageError::ArbiterAlreadySet);
        }
        if arbiter.is_zero() {
            return Err(BondageError::InvalidParameters(
                "arbiter cannot be the zero address".to_string(),
            ));
        }
        self.arbiter = Some(arbiter);
        Ok(())
    }
}
