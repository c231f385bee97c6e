//! Token Contract Errors

use lib_types::{Address, Amount};
use thiserror::Error;

/// Error during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Unauthorized: {0:?} is not the token owner")]
    Unauthorized(Address),

    #[error("Conservation invariant violated: {0}")]
    ConservationViolated(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
