//! Per-dot cost tests for every curve kind

use lib_bondage::{cost_of_dot, dots_for_tokens, CurveError, CurveSpec, CurveType};

const START: u128 = 1;
const MULTIPLIER: u128 = 2;
const DOT: u64 = 27;

#[test]
fn test_current_cost_linear() {
    let spec = CurveSpec::linear(START, MULTIPLIER);
    assert_eq!(cost_of_dot(&spec, DOT).unwrap(), 55);
}

#[test]
fn test_current_cost_exponential() {
    let spec = CurveSpec::exponential(START, MULTIPLIER);
    assert_eq!(cost_of_dot(&spec, DOT).unwrap(), 1_459);
}

#[test]
fn test_current_cost_logarithmic() {
    let spec = CurveSpec::logarithmic(START, MULTIPLIER);
    // ceil(2 * 4.7549 + 1)
    assert_eq!(cost_of_dot(&spec, DOT).unwrap(), 11);
    assert_eq!(
        cost_of_dot(&spec, 0),
        Err(CurveError::OutOfDomain { index: 0 })
    );
}

#[test]
fn test_legacy_encoding_matches_constructors() {
    assert_eq!(
        CurveType::from_legacy(1, START, MULTIPLIER).unwrap(),
        CurveSpec::linear(START, MULTIPLIER).curve_type
    );
    assert_eq!(
        CurveType::from_legacy(3, START, MULTIPLIER).unwrap(),
        CurveSpec::logarithmic(START, MULTIPLIER).curve_type
    );
    assert!(CurveType::from_legacy(9, START, MULTIPLIER).is_err());
}

#[test]
fn test_ceil_log2_small_values() {
    let spec = CurveSpec::logarithmic(0, 1);
    for i in 1u64..=100 {
        let expected = (i as f64).log2().ceil() as u128;
        assert_eq!(cost_of_dot(&spec, i).unwrap(), expected, "log2({})", i);
    }
}

#[test]
fn test_ceil_log2_large_multiplier() {
    // 27^200 does not fit in u128
    let spec = CurveSpec::logarithmic(0, 200);
    assert_eq!(cost_of_dot(&spec, DOT).unwrap(), 951);

    // powers of two stay exact
    assert_eq!(cost_of_dot(&spec, 1 << 20).unwrap(), 4_000);
}

#[test]
fn test_log_cost_exact_beyond_f64_precision() {
    let spec = CurveSpec::logarithmic(0, 100_000_000_000_000_000_000);
    assert_eq!(cost_of_dot(&spec, 3).unwrap(), 158_496_250_072_115_618_146);

    let spec = CurveSpec::logarithmic(0, 10_000_000_000_000_000_000);
    assert_eq!(cost_of_dot(&spec, 12_345).unwrap(), 135_916_392_160_301_442_064);
}

#[test]
fn test_log_quote_with_multiplier_above_2_pow_66() {
    let spec = CurveSpec::logarithmic(0, 1 << 67).with_max_dots(256);
    // positions 254 and 255 price indices 255 and 256
    let quote = dots_for_tokens(&spec, 254, u128::MAX).unwrap();
    assert_eq!(quote.dots, 2);
    assert_eq!(
        quote.tokens,
        1_179_758_335_076_125_790_381 + 1_180_591_620_717_411_303_424
    );
}

#[test]
fn test_uninitialized_curve_has_no_cost() {
    assert_eq!(
        cost_of_dot(&CurveSpec::uninitialized(), DOT),
        Err(CurveError::Uninitialized)
    );
}
