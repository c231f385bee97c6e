//! Bonding Curves
//!
//! - `types`: curve encodings, decoding and per-dot cost
//! - `evaluator`: cumulative pricing (dots for tokens, tokens for dots)

pub mod evaluator;
pub mod types;

pub use evaluator::{
    cost_of_dot, dots_for_tokens, refund_for_dots, remaining_capacity, tokens_for_dots, BondQuote,
};
pub use types::{CurveError, CurveSpec, CurveType, Piece, PiecewiseTerm, DEFAULT_DOT_CEILING};
