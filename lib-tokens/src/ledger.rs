//! Token Ledger
//!
//! A token contract paired with its balance store. This is the account-level
//! API other components call: allocate, approve, transfer, transfer_from.

use lib_types::{Address, Amount};

use crate::contract::{TokenContract, TransferResult, DEFAULT_DECIMALS};
use crate::errors::TokenResult;
use crate::transfer::{
    apply_allocate, apply_token_transfer, apply_transfer_from, MemoryTokenStore, TokenStore,
};

/// In-memory fungible token ledger
#[derive(Debug, Clone)]
pub struct TokenLedger {
    contract: TokenContract,
    store: MemoryTokenStore,
}

impl TokenLedger {
    /// Create a ledger for a fresh token owned by `owner`
    pub fn new(name: &str, symbol: &str, owner: Address) -> Self {
        Self {
            contract: TokenContract::new(
                name.to_string(),
                symbol.to_string(),
                DEFAULT_DECIMALS,
                owner,
            ),
            store: MemoryTokenStore::new(),
        }
    }

    pub fn contract(&self) -> &TokenContract {
        &self.contract
    }

    pub fn total_supply(&self) -> Amount {
        self.contract.total_supply
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.store.get_balance(address).unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.store.get_allowance(owner, spender).unwrap_or(0)
    }

    /// Mint new supply to `to` (owner only). Returns the new balance of `to`.
    pub fn allocate(&mut self, caller: Address, to: Address, amount: Amount) -> TokenResult<Amount> {
        let balance = apply_allocate(&mut self.store, &mut self.contract, caller, to, amount)?;
        tracing::debug!("Allocated {} {} to {:?}", amount, self.contract.symbol, to);
        Ok(balance)
    }

    /// Let `spender` pull up to `amount` from `owner`. Overwrites any previous allowance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> TokenResult<()> {
        self.store.set_allowance(&owner, &spender, amount)
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> TokenResult<TransferResult> {
        apply_token_transfer(&mut self.store, from, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> TokenResult<TransferResult> {
        apply_transfer_from(&mut self.store, spender, from, to, amount)
    }
}
