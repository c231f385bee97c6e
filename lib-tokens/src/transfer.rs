//! Token Transfer Execution
//!
//! The `apply_*` functions are the canonical way to move token balances.
//! Each one validates every precondition before the first write, so a failed
//! call leaves the store untouched.

use std::collections::HashMap;

use lib_types::{Address, Amount};

use crate::contract::{TokenContract, TransferResult};
use crate::errors::{TokenError, TokenResult};

/// Trait for token storage operations
///
/// This trait defines the minimal storage interface needed for token transfers.
pub trait TokenStore {
    /// Get token balance for an address
    fn get_balance(&self, address: &Address) -> TokenResult<Amount>;

    /// Set token balance for an address
    fn set_balance(&mut self, address: &Address, amount: Amount) -> TokenResult<()>;

    /// Get the amount `spender` may pull from `owner`
    fn get_allowance(&self, owner: &Address, spender: &Address) -> TokenResult<Amount>;

    /// Set the amount `spender` may pull from `owner`
    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()>;
}

/// HashMap-backed token store
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_balance(&self, address: &Address) -> TokenResult<Amount> {
        Ok(self.balances.get(address).copied().unwrap_or(0))
    }

    fn set_balance(&mut self, address: &Address, amount: Amount) -> TokenResult<()> {
        self.balances.insert(*address, amount);
        Ok(())
    }

    fn get_allowance(&self, owner: &Address, spender: &Address) -> TokenResult<Amount> {
        Ok(self
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0))
    }

    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()> {
        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }
}

/// Apply a token transfer with full validation
///
/// # Enforcement
///
/// - **Amount > 0**
/// - **Sufficient balance**: sender must hold at least `amount`
/// - **Conservation**: sender debit equals recipient credit
pub fn apply_token_transfer(
    store: &mut dyn TokenStore,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<TransferResult> {
    if amount == 0 {
        return Err(TokenError::ZeroAmount);
    }

    let from_balance = store.get_balance(&from)?;
    if from_balance < amount {
        return Err(TokenError::InsufficientBalance {
            have: from_balance,
            need: amount,
        });
    }

    if from == to {
        return Ok(TransferResult {
            amount,
            sender_balance: from_balance,
            recipient_balance: from_balance,
        });
    }

    let to_balance = store.get_balance(&to)?;
    let new_from_balance = from_balance
        .checked_sub(amount)
        .ok_or(TokenError::Underflow)?;
    let new_to_balance = to_balance
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    // sender_debit == recipient_credit
    if from_balance - new_from_balance != new_to_balance - to_balance {
        return Err(TokenError::ConservationViolated(format!(
            "debit ({}) != credit ({})",
            from_balance - new_from_balance,
            new_to_balance - to_balance
        )));
    }

    store.set_balance(&from, new_from_balance)?;
    store.set_balance(&to, new_to_balance)?;

    Ok(TransferResult {
        amount,
        sender_balance: new_from_balance,
        recipient_balance: new_to_balance,
    })
}

/// Apply a delegated transfer: `spender` moves `amount` from `from` to `to`
/// using a previously granted allowance.
pub fn apply_transfer_from(
    store: &mut dyn TokenStore,
    spender: Address,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<TransferResult> {
    if amount == 0 {
        return Err(TokenError::ZeroAmount);
    }

    let allowance = store.get_allowance(&from, &spender)?;
    if allowance < amount {
        return Err(TokenError::InsufficientAllowance {
            have: allowance,
            need: amount,
        });
    }

    let result = apply_token_transfer(store, from, to, amount)?;
    store.set_allowance(&from, &spender, allowance - amount)?;
    Ok(result)
}

/// Mint `amount` new tokens to `to`; only the contract owner may allocate.
pub fn apply_allocate(
    store: &mut dyn TokenStore,
    contract: &mut TokenContract,
    caller: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<Amount> {
    if !contract.can_allocate(&caller) {
        return Err(TokenError::Unauthorized(caller));
    }
    if amount == 0 {
        return Err(TokenError::ZeroAmount);
    }

    let new_supply = contract
        .total_supply
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;
    let new_balance = store
        .get_balance(&to)?
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    store.set_balance(&to, new_balance)?;
    contract.total_supply = new_supply;
    Ok(new_balance)
}
