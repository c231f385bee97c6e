//! Token collaborator: how the bonding service moves the bonding token

use lib_tokens::TokenLedger;
use lib_types::{Address, Amount};

use crate::errors::BondageResult;

pub trait TokenCollaborator {
    /// Pull `amount` from `payer` into `service`, spending the allowance
    /// `payer` granted to `service`
    fn transfer_from(&mut self, service: Address, payer: Address, amount: Amount) -> BondageResult<()>;

    /// Pay `amount` out of `service` to `recipient`
    fn transfer(&mut self, service: Address, recipient: Address, amount: Amount) -> BondageResult<()>;
}

impl TokenCollaborator for TokenLedger {
    fn transfer_from(&mut self, service: Address, payer: Address, amount: Amount) -> BondageResult<()> {
        TokenLedger::transfer_from(self, service, payer, service, amount)?;
        Ok(())
    }

    fn transfer(&mut self, service: Address, recipient: Address, amount: Amount) -> BondageResult<()> {
        TokenLedger::transfer(self, service, recipient, amount)?;
        Ok(())
    }
}
