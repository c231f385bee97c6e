//! Bondage Errors

use lib_tokens::TokenError;
use lib_types::{Address, Amount, DotCount, Specifier};
use thiserror::Error;

use crate::curve::CurveError;

/// Error during bonding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BondageError {
    #[error("Provider not registered: {0:?}")]
    ProviderUnregistered(Address),

    #[error("Provider already registered: {0:?}")]
    ProviderAlreadyRegistered(Address),

    #[error("Curve not initialized for provider {provider:?}, specifier {specifier:?}")]
    CurveUninitialized {
        provider: Address,
        specifier: Specifier,
    },

    #[error("Curve for provider {provider:?}, specifier {specifier:?} is in use and cannot be replaced")]
    CurveLocked {
        provider: Address,
        specifier: Specifier,
    },

    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Insufficient dots: have {have}, need {need}")]
    InsufficientDots { have: DotCount, need: DotCount },

    #[error("Insufficient token allowance: have {have}, need {need}")]
    InsufficientTokenAllowance { have: Amount, need: Amount },

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Delegate already used for subscriber {subscriber:?}, provider {provider:?}")]
    DelegateAlreadyUsed {
        subscriber: Address,
        provider: Address,
    },

    #[error("No active delegate {caller:?} for subscriber {subscriber:?}, provider {provider:?}")]
    NoActiveDelegate {
        caller: Address,
        subscriber: Address,
        provider: Address,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Arbiter address already set")]
    ArbiterAlreadySet,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TokenError> for BondageError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance { have, need } => {
                BondageError::InsufficientBalance { have, need }
            }
            TokenError::InsufficientAllowance { have, need } => {
                BondageError::InsufficientTokenAllowance { have, need }
            }
            other => BondageError::Token(other.to_string()),
        }
    }
}

/// Result type for bonding operations
pub type BondageResult<T> = Result<T, BondageError>;
