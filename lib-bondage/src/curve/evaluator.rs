//! Curve Evaluator
//!
//! Pure pricing functions over a [`CurveSpec`]. Dots are priced by their
//! issuance position: the dot issued when `issued` dots already exist sits at
//! position `issued` and costs `cost_at(issued + domain_origin)`. Price
//! therefore follows total issuance, not any single subscriber's holdings.
//!
//! # Invariants
//! - `dots_for_tokens` never spends more than the budget
//! - `tokens_for_dots(spec, issued, dots_for_tokens(spec, issued, b).dots)`
//!   equals the quoted token cost
//! - Issuance never passes the curve ceiling

use serde::{Deserialize, Serialize};

use lib_types::{Amount, DotCount};

use super::types::{CurveError, CurveSpec};

/// Dots granted for a token budget and the exact tokens they cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondQuote {
    pub dots: DotCount,
    pub tokens: Amount,
}

impl BondQuote {
    pub const ZERO: Self = Self { dots: 0, tokens: 0 };
}

/// Token cost of the dot at raw curve `index`
pub fn cost_of_dot(spec: &CurveSpec, index: DotCount) -> Result<Amount, CurveError> {
    spec.curve_type.cost_at(index)
}

/// Number of positions still issuable once `issued` dots exist
pub fn remaining_capacity(spec: &CurveSpec, issued: DotCount) -> DotCount {
    let origin = spec.curve_type.domain_origin();
    let by_domain = match spec.curve_type.domain_end() {
        Some(end) if end >= origin => (end - origin).saturating_add(1),
        Some(_) => 0,
        None => DotCount::MAX,
    };
    spec.max_dots.min(by_domain).saturating_sub(issued)
}

fn price_at_position(spec: &CurveSpec, position: DotCount) -> Result<Amount, CurveError> {
    let index = position
        .checked_add(spec.curve_type.domain_origin())
        .ok_or(CurveError::Overflow)?;
    spec.curve_type.cost_at(index)
}

fn require_initialized(spec: &CurveSpec) -> Result<(), CurveError> {
    if spec.is_initialized() {
        Ok(())
    } else {
        Err(CurveError::Uninitialized)
    }
}

/// Largest whole number of dots affordable with `budget`, starting at
/// position `issued`.
///
/// Saturates at the curve ceiling; the unspent remainder is never charged.
pub fn dots_for_tokens(
    spec: &CurveSpec,
    issued: DotCount,
    budget: Amount,
) -> Result<BondQuote, CurveError> {
    require_initialized(spec)?;
    if budget == 0 {
        return Ok(BondQuote::ZERO);
    }

    let capacity = remaining_capacity(spec, issued);
    let mut quote = BondQuote::ZERO;
    while quote.dots < capacity {
        let price = match price_at_position(spec, issued + quote.dots) {
            Ok(price) => price,
            // a gap in the domain or a price beyond u128 ends the purchase
            Err(CurveError::OutOfDomain { .. }) | Err(CurveError::Overflow) => break,
            Err(e) => return Err(e),
        };
        match quote.tokens.checked_add(price) {
            Some(total) if total <= budget => {
                quote.tokens = total;
                quote.dots += 1;
            }
            _ => break,
        }
    }
    Ok(quote)
}

/// Cumulative cost of `count` dots at positions `issued .. issued + count`
pub fn tokens_for_dots(
    spec: &CurveSpec,
    issued: DotCount,
    count: DotCount,
) -> Result<Amount, CurveError> {
    require_initialized(spec)?;
    let capacity = remaining_capacity(spec, issued);
    if count > capacity {
        let beyond = issued.saturating_add(capacity);
        return Err(CurveError::OutOfDomain {
            index: beyond.saturating_add(spec.curve_type.domain_origin()),
        });
    }

    (issued..issued + count).try_fold(0 as Amount, |total, position| {
        total
            .checked_add(price_at_position(spec, position)?)
            .ok_or(CurveError::Overflow)
    })
}

/// Tokens returned for removing the top `count` of `issued` dots
pub fn refund_for_dots(
    spec: &CurveSpec,
    issued: DotCount,
    count: DotCount,
) -> Result<Amount, CurveError> {
    let floor = issued
        .checked_sub(count)
        .ok_or(CurveError::ExceedsIssued {
            requested: count,
            issued,
        })?;
    tokens_for_dots(spec, floor, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn linear() -> CurveSpec {
        CurveSpec::linear(1, 2)
    }

    fn piecewise() -> CurveSpec {
        CurveSpec::piecewise(&[2, 2, 0, 1, 1, 1, 10, 0, 0], &[0, 5, 5, 100], &[1, 3]).unwrap()
    }

    #[test]
    fn test_bond_rate_26_tokens() {
        let quote = dots_for_tokens(&linear(), 0, 26).unwrap();
        assert_eq!(quote, BondQuote { dots: 5, tokens: 25 });
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(dots_for_tokens(&linear(), 0, 0).unwrap(), BondQuote::ZERO);
        assert_eq!(dots_for_tokens(&linear(), 7, 0).unwrap(), BondQuote::ZERO);
    }

    #[test]
    fn test_ceiling_saturates() {
        let spec = linear().with_max_dots(31);
        // cost of 32 dots: 32² = 1024
        let budget = tokens_for_dots(&linear(), 0, 32).unwrap();
        assert_eq!(budget, 1024);

        let quote = dots_for_tokens(&spec, 0, budget).unwrap();
        assert_eq!(quote.dots, 31);
        assert_eq!(quote.tokens, 961);
    }

    #[test]
    fn test_price_follows_issuance() {
        // 5 dots already out: next dots cost 11, 13, ...
        let quote = dots_for_tokens(&linear(), 5, 14).unwrap();
        assert_eq!(quote, BondQuote { dots: 1, tokens: 11 });
    }

    #[test]
    fn test_piecewise_zap_for_five_dots() {
        assert_eq!(tokens_for_dots(&piecewise(), 0, 5).unwrap(), 25);
    }

    #[test]
    fn test_piecewise_domain_is_a_ceiling() {
        let spec = piecewise();
        assert_eq!(remaining_capacity(&spec, 0), 100);
        assert_eq!(remaining_capacity(&spec, 99), 1);

        let quote = dots_for_tokens(&spec, 98, Amount::MAX).unwrap();
        assert_eq!(quote.dots, 2);
        assert!(matches!(
            tokens_for_dots(&spec, 98, 3),
            Err(CurveError::OutOfDomain { index: 101 })
        ));
    }

    #[test]
    fn test_logarithmic_first_dot_priced_at_one() {
        let spec = CurveSpec::logarithmic(1, 2);
        // indices 1, 2, 3: 1, 3, ceil(2*1.585+1) = 5
        assert_eq!(tokens_for_dots(&spec, 0, 3).unwrap(), 9);
        assert_eq!(dots_for_tokens(&spec, 0, 9).unwrap(), BondQuote { dots: 3, tokens: 9 });
    }

    #[test]
    fn test_refund_takes_top_of_curve() {
        // positions 5 and 4 cost 11 and 9
        assert_eq!(refund_for_dots(&linear(), 6, 2).unwrap(), 20);
        assert_eq!(
            refund_for_dots(&linear(), 1, 2),
            Err(CurveError::ExceedsIssued { requested: 2, issued: 1 })
        );
    }

    #[test]
    fn test_uninitialized_curve_fails() {
        let spec = CurveSpec::uninitialized();
        assert_eq!(dots_for_tokens(&spec, 0, 26), Err(CurveError::Uninitialized));
        assert_eq!(tokens_for_dots(&spec, 0, 5), Err(CurveError::Uninitialized));
    }

    #[test]
    fn test_overflowing_price_stops_purchase() {
        let spec = CurveSpec::exponential(0, Amount::MAX / 2);
        let quote = dots_for_tokens(&spec, 0, Amount::MAX).unwrap();
        // index 0 is free, index 1 costs MAX/2, index 2 overflows
        assert_eq!(quote.dots, 2);
    }

    /// (1 + 2x + x²) / 2 up to 50, then x² up to 200
    fn multi_term_piecewise() -> CurveSpec {
        CurveSpec::piecewise(&[3, 1, 0, 2, 1, 1, 2, 1, 1, 2], &[1, 50, 51, 200], &[2, 1]).unwrap()
    }

    /// Every curve shape with strictly positive prices
    fn priced_curves() -> [CurveSpec; 5] {
        [
            linear(),
            CurveSpec::exponential(3, 1),
            CurveSpec::logarithmic(2, 3),
            piecewise(),
            multi_term_piecewise(),
        ]
    }

    #[test]
    fn test_multi_term_piecewise_prices() {
        let spec = multi_term_piecewise();
        // (1+2+1)/2, (1+4+4)/2
        assert_eq!(tokens_for_dots(&spec, 0, 2).unwrap(), 6);
        // index 51 switches to x²
        assert_eq!(cost_of_dot(&spec, 50).unwrap(), 1_300);
        assert_eq!(cost_of_dot(&spec, 51).unwrap(), 2_601);
        assert_eq!(remaining_capacity(&spec, 0), 200);
    }

    proptest! {
        #[test]
        fn prop_dots_monotonic_in_budget(
            issued in 0u64..200,
            a in 0u128..50_000,
            b in 0u128..50_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for spec in priced_curves() {
                let q_lo = dots_for_tokens(&spec, issued, lo).unwrap();
                let q_hi = dots_for_tokens(&spec, issued, hi).unwrap();
                prop_assert!(q_lo.dots <= q_hi.dots);
                prop_assert!(q_hi.tokens <= hi);
            }
        }

        #[test]
        fn prop_quote_cost_round_trips(issued in 0u64..200, budget in 0u128..100_000) {
            for spec in priced_curves() {
                let quote = dots_for_tokens(&spec, issued, budget).unwrap();
                prop_assert_eq!(tokens_for_dots(&spec, issued, quote.dots).unwrap(), quote.tokens);
            }
        }

        #[test]
        fn prop_dot_count_round_trips(issued in 0u64..200, n in 0u64..300) {
            for spec in priced_curves() {
                let n = n.min(remaining_capacity(&spec, issued));
                let cost = tokens_for_dots(&spec, issued, n).unwrap();
                prop_assert_eq!(dots_for_tokens(&spec, issued, cost).unwrap().dots, n);
            }
        }
    }
}
