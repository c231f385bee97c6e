//! Bonding Token
//!
//! This crate defines the fungible token that subscribers lock against a
//! provider's curve.
//!
//! # Key Types
//!
//! - [`TokenContract`]: token metadata and supply
//! - [`TokenStore`]: balance and allowance storage
//! - [`TokenLedger`]: contract + store, the API used by the bonding service
//!
//! # Execution
//!
//! Use [`apply_token_transfer`] and [`apply_transfer_from`] to execute
//! transfers with full validation.

pub mod contract;
pub mod errors;
pub mod ledger;
pub mod transfer;

pub use contract::*;
pub use errors::*;
pub use ledger::TokenLedger;
pub use transfer::{
    apply_allocate, apply_token_transfer, apply_transfer_from, MemoryTokenStore, TokenStore,
};
