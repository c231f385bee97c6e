//! TokenContract
//!
//! Metadata and supply bookkeeping for the fungible token that subscribers
//! lock when bonding. Balances and allowances live in a [`TokenStore`].
//!
//! [`TokenStore`]: crate::transfer::TokenStore

use serde::{Deserialize, Serialize};

use lib_types::{Address, Amount};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Decimal places used by the bonding token
pub const DEFAULT_DECIMALS: u8 = 18;

// =============================================================================
// TOKEN CONTRACT
// =============================================================================

/// Fungible token contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenContract {
    /// Human-readable token name
    pub name: String,
    /// Token symbol (e.g., "ZAP")
    pub symbol: String,
    /// Number of decimal places (display only)
    pub decimals: u8,
    /// Only the owner may allocate new supply
    pub owner: Address,
    /// Total supply in circulation
    pub total_supply: Amount,
}

impl TokenContract {
    /// Create a new token contract with zero supply
    pub fn new(name: String, symbol: String, decimals: u8, owner: Address) -> Self {
        Self {
            name,
            symbol,
            decimals,
            owner,
            total_supply: 0,
        }
    }

    /// Check if an address may allocate supply
    pub fn can_allocate(&self, address: &Address) -> bool {
        *address == self.owner
    }
}

// =============================================================================
// TRANSFER RESULT
// =============================================================================

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Amount credited to the recipient
    pub amount: Amount,
    /// Sender balance after the debit
    pub sender_balance: Amount,
    /// Recipient balance after the credit
    pub recipient_balance: Amount,
}
