//! Token Bonding Engine
//!
//! Subscribers lock bonding tokens against a provider's published curve and
//! receive dots (usage credits). Dots can be unbonded for a refund, bonded by
//! a one-shot delegate, or held in escrow and released by the arbiter.
//!
//! # Architecture
//! - `curve`: curve encodings and pricing (dots for tokens and back)
//! - `ledger`: bound and escrowed dots, issuance per curve
//! - `delegation`: one-shot delegate per (subscriber, provider)
//! - `registry`: providers and their curves
//! - `token`: the token collaborator seam
//! - `service`: [`BondingService`], the orchestrator and sole ledger writer
//! - `config`: TOML configuration

pub mod authority;
pub mod config;
pub mod curve;
pub mod delegation;
pub mod errors;
pub mod ledger;
pub mod registry;
pub mod service;
pub mod token;

pub use authority::AuthorityContext;
pub use config::{load_config, BondageConfig};
pub use curve::{
    cost_of_dot, dots_for_tokens, refund_for_dots, tokens_for_dots, BondQuote, CurveError,
    CurveSpec, CurveType, DEFAULT_DOT_CEILING,
};
pub use delegation::{DelegationState, DelegationTable};
pub use errors::{BondageError, BondageResult};
pub use ledger::{BondKey, BondingLedger, CurveKey, LedgerUpdate};
pub use registry::{CurveRegistry, InMemoryCurveRegistry, ProviderRecord, RegistryStats};
pub use service::BondingService;
pub use token::TokenCollaborator;
