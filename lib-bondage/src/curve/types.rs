//! Curve Types
//!
//! Pricing curves that map a dot's index to its token cost. Two encodings are
//! accepted and decoded into one [`CurveType`]:
//!
//! - the legacy `(kind, start, multiplier)` triple
//! - the piecewise `(constants, parts, dividers)` polynomial encoding
//!
//! # Piecewise encoding
//! ```text
//!   parts     = [s0, e0, s1, e1, ...]          inclusive index range per piece
//!   constants = [n0, c, p, c, p, ..., n1, ...] term count, then (coef, power) pairs
//!   dividers  = [d0, d1, ...]                  one divisor per piece
//!
//!   cost(x) = floor( Σ coef * x^power / d )    for the first piece containing x
//! ```

use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib_types::{Amount, DotCount};

/// Ceiling applied to curves that do not set one explicitly
pub const DEFAULT_DOT_CEILING: DotCount = 1_000_000;

/// Errors from curve decoding and evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("Curve is not initialized")]
    Uninitialized,

    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    #[error("Dot index {index} is outside the curve domain")]
    OutOfDomain { index: DotCount },

    #[error("Cannot remove {requested} dots, only {issued} issued")]
    ExceedsIssued { requested: DotCount, issued: DotCount },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// One `coefficient * x^power` term of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecewiseTerm {
    pub coefficient: Amount,
    pub power: u32,
}

/// A polynomial over an inclusive index interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub start: DotCount,
    pub end: DotCount,
    pub terms: Vec<PiecewiseTerm>,
    pub divider: Amount,
}

impl Piece {
    pub fn contains(&self, index: DotCount) -> bool {
        self.start <= index && index <= self.end
    }

    fn evaluate(&self, index: DotCount) -> Result<Amount, CurveError> {
        let x = index as Amount;
        let mut sum: Amount = 0;
        for term in &self.terms {
            let value = x
                .checked_pow(term.power)
                .and_then(|p| p.checked_mul(term.coefficient))
                .ok_or(CurveError::Overflow)?;
            sum = sum.checked_add(value).ok_or(CurveError::Overflow)?;
        }
        Ok(sum / self.divider)
    }
}

/// Bonding curve pricing formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    /// No curve set; every evaluation fails
    None,
    /// cost = multiplier × x + start
    Linear { start: Amount, multiplier: Amount },
    /// cost = multiplier × x² + start
    Exponential { start: Amount, multiplier: Amount },
    /// cost = ⌈multiplier × log2(x) + start⌉, x ≥ 1
    Logarithmic { start: Amount, multiplier: Amount },
    /// Sum of polynomial terms selected by index interval
    Piecewise { pieces: Vec<Piece> },
}

impl CurveType {
    /// Decode the legacy `(kind, start, multiplier)` triple.
    ///
    /// Kind codes: 0 = None, 1 = Linear, 2 = Exponential, 3 = Logarithmic.
    pub fn from_legacy(kind: u8, start: Amount, multiplier: Amount) -> Result<Self, CurveError> {
        match kind {
            0 => Ok(CurveType::None),
            1 => Ok(CurveType::Linear { start, multiplier }),
            2 => Ok(CurveType::Exponential { start, multiplier }),
            3 => Ok(CurveType::Logarithmic { start, multiplier }),
            other => Err(CurveError::InvalidCurve(format!(
                "unknown legacy curve kind {}",
                other
            ))),
        }
    }

    /// Decode the `(constants, parts, dividers)` encoding
    pub fn from_piecewise(
        constants: &[u64],
        parts: &[u64],
        dividers: &[u64],
    ) -> Result<Self, CurveError> {
        if parts.is_empty() || parts.len() % 2 != 0 {
            return Err(CurveError::InvalidCurve(format!(
                "parts must hold start/end pairs, got {} values",
                parts.len()
            )));
        }
        let piece_count = parts.len() / 2;
        if dividers.len() != piece_count {
            return Err(CurveError::InvalidCurve(format!(
                "expected {} dividers, got {}",
                piece_count,
                dividers.len()
            )));
        }

        let mut cursor = 0usize;
        let mut pieces = Vec::with_capacity(piece_count);
        for (i, bounds) in parts.chunks_exact(2).enumerate() {
            let (start, end) = (bounds[0], bounds[1]);
            if start > end {
                return Err(CurveError::InvalidCurve(format!(
                    "piece {} starts at {} after its end {}",
                    i, start, end
                )));
            }
            if dividers[i] == 0 {
                return Err(CurveError::InvalidCurve(format!("piece {} has a zero divider", i)));
            }

            let term_count = *constants.get(cursor).ok_or_else(|| {
                CurveError::InvalidCurve(format!("constants end before piece {}", i))
            })? as usize;
            cursor += 1;

            let terms_end = term_count
                .checked_mul(2)
                .and_then(|n| n.checked_add(cursor))
                .filter(|&end| end <= constants.len())
                .ok_or_else(|| {
                    CurveError::InvalidCurve(format!("piece {} declares {} terms", i, term_count))
                })?;
            let raw_terms = &constants[cursor..terms_end];
            cursor = terms_end;

            let terms = raw_terms
                .chunks_exact(2)
                .map(|pair| {
                    let power = u32::try_from(pair[1]).map_err(|_| {
                        CurveError::InvalidCurve(format!("power {} too large", pair[1]))
                    })?;
                    Ok(PiecewiseTerm {
                        coefficient: pair[0] as Amount,
                        power,
                    })
                })
                .collect::<Result<Vec<_>, CurveError>>()?;

            pieces.push(Piece {
                start,
                end,
                terms,
                divider: dividers[i] as Amount,
            });
        }

        if constants[cursor..].iter().any(|&c| c != 0) {
            return Err(CurveError::InvalidCurve(
                "unconsumed non-zero constants after last piece".to_string(),
            ));
        }

        let curve = CurveType::Piecewise { pieces };
        curve.validate()?;
        Ok(curve)
    }

    /// Check that the curve can price every index from its origin up to its end.
    ///
    /// Piecewise intervals may overlap but must leave no gap starting at index 1.
    pub fn validate(&self) -> Result<(), CurveError> {
        let CurveType::Piecewise { pieces } = self else {
            return Ok(());
        };
        if pieces.is_empty() {
            return Err(CurveError::InvalidCurve("piecewise curve has no pieces".to_string()));
        }
        if let Some(piece) = pieces.iter().find(|p| p.start > p.end || p.divider == 0) {
            return Err(CurveError::InvalidCurve(format!(
                "malformed piece [{}, {}]",
                piece.start, piece.end
            )));
        }

        let mut bounds: Vec<(DotCount, DotCount)> = pieces.iter().map(|p| (p.start, p.end)).collect();
        bounds.sort_unstable();

        // first index not yet covered
        let mut next = self.domain_origin();
        for (start, end) in bounds {
            if start > next {
                return Err(CurveError::InvalidCurve(format!(
                    "pieces leave index {} uncovered",
                    next
                )));
            }
            match end.checked_add(1) {
                Some(after) => next = next.max(after),
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Get display name for the curve type
    pub fn name(&self) -> &'static str {
        match self {
            CurveType::None => "none",
            CurveType::Linear { .. } => "linear",
            CurveType::Exponential { .. } => "exponential",
            CurveType::Logarithmic { .. } => "logarithmic",
            CurveType::Piecewise { .. } => "piecewise",
        }
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, CurveType::None)
    }

    /// Index at which the first issued dot is priced.
    ///
    /// Logarithmic and piecewise curves are undefined at 0, so their first dot
    /// is priced at index 1.
    pub fn domain_origin(&self) -> DotCount {
        match self {
            CurveType::Logarithmic { .. } | CurveType::Piecewise { .. } => 1,
            _ => 0,
        }
    }

    /// Last index covered by the curve, if bounded
    pub fn domain_end(&self) -> Option<DotCount> {
        match self {
            CurveType::Piecewise { pieces } => pieces.iter().map(|p| p.end).max(),
            _ => None,
        }
    }

    /// Token cost of the dot at `index`
    pub fn cost_at(&self, index: DotCount) -> Result<Amount, CurveError> {
        match self {
            CurveType::None => Err(CurveError::Uninitialized),
            CurveType::Linear { start, multiplier } => multiplier
                .checked_mul(index as Amount)
                .and_then(|v| v.checked_add(*start))
                .ok_or(CurveError::Overflow),
            CurveType::Exponential { start, multiplier } => {
                let x = index as Amount;
                x.checked_mul(x)
                    .and_then(|sq| sq.checked_mul(*multiplier))
                    .and_then(|v| v.checked_add(*start))
                    .ok_or(CurveError::Overflow)
            }
            CurveType::Logarithmic { start, multiplier } => {
                if index == 0 {
                    return Err(CurveError::OutOfDomain { index });
                }
                ceil_mul_log2(index, *multiplier)?
                    .checked_add(*start)
                    .ok_or(CurveError::Overflow)
            }
            CurveType::Piecewise { pieces } => pieces
                .iter()
                .find(|p| p.contains(index))
                .ok_or(CurveError::OutOfDomain { index })?
                .evaluate(index),
        }
    }
}

impl std::fmt::Display for CurveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveType::Linear { start, multiplier }
            | CurveType::Exponential { start, multiplier }
            | CurveType::Logarithmic { start, multiplier } => {
                write!(f, "{}(start={}, multiplier={})", self.name(), start, multiplier)
            }
            CurveType::Piecewise { pieces } => write!(f, "piecewise({} pieces)", pieces.len()),
            CurveType::None => write!(f, "none"),
        }
    }
}

/// ⌈multiplier × log2(x)⌉ for x ≥ 1, without floating point.
///
/// The answer is the bit length of `x^m - 1`. When `x^m` fits in u128 it is
/// computed directly; otherwise `x^m` is bracketed between a lower and an
/// upper bound, each held as a 256-bit mantissa and a binary exponent.
fn ceil_mul_log2(x: DotCount, multiplier: Amount) -> Result<Amount, CurveError> {
    if multiplier == 0 || x == 1 {
        return Ok(0);
    }

    if let Ok(m) = u32::try_from(multiplier) {
        if let Some(p) = (x as u128).checked_pow(m) {
            return Ok((128 - (p - 1).leading_zeros()) as Amount);
        }
    }

    if x.is_power_of_two() {
        return multiplier
            .checked_mul(x.trailing_zeros() as Amount)
            .ok_or(CurveError::Overflow);
    }

    // x is not a power of two, so neither is x^m: ⌈m·log2 x⌉ = ⌊log2 x^m⌋ + 1
    let (lower, upper) = PowBound::bracket(x, multiplier)?;
    let floor = upper.floor_log2()?;
    if lower.floor_log2()? != floor {
        tracing::debug!(
            "log2 bracket of {}^{} straddles 2^{}, using upper bound",
            x,
            multiplier,
            floor
        );
    }
    floor.checked_add(1).ok_or(CurveError::Overflow)
}

/// Mantissa width of [`PowBound`]
const POW_MANTISSA_BITS: usize = 256;

/// `mantissa × 2^exponent`, a directed-rounding bound on a power of x
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PowBound {
    mantissa: U256,
    exponent: u128,
}

impl PowBound {
    fn exact(value: u64) -> Self {
        Self {
            mantissa: U256::from(value),
            exponent: 0,
        }
    }

    /// Lower and upper bounds on `x^m`, by square-and-multiply
    fn bracket(x: DotCount, m: Amount) -> Result<(Self, Self), CurveError> {
        let mut lower = Self::exact(1);
        let mut upper = Self::exact(1);
        let mut base_lower = Self::exact(x);
        let mut base_upper = Self::exact(x);
        let mut e = m;
        loop {
            if e & 1 == 1 {
                lower = lower.mul(&base_lower, false)?;
                upper = upper.mul(&base_upper, true)?;
            }
            e >>= 1;
            if e == 0 {
                return Ok((lower, upper));
            }
            base_lower = base_lower.mul(&base_lower, false)?;
            base_upper = base_upper.mul(&base_upper, true)?;
        }
    }

    fn mul(&self, other: &Self, round_up: bool) -> Result<Self, CurveError> {
        let product = self.mantissa.full_mul(other.mantissa);
        let excess = product.bits().saturating_sub(POW_MANTISSA_BITS);
        let mut kept = product >> excess;
        if round_up && (kept << excess) != product {
            kept = kept + U512::one();
        }

        let mut exponent = self
            .exponent
            .checked_add(other.exponent)
            .and_then(|e| e.checked_add(excess as u128))
            .ok_or(CurveError::Overflow)?;
        // rounding up may carry into bit 256; the carried value is a power of two
        if kept.bits() > POW_MANTISSA_BITS {
            kept = kept >> 1;
            exponent = exponent.checked_add(1).ok_or(CurveError::Overflow)?;
        }

        Ok(Self {
            mantissa: U256::try_from(kept).map_err(|_| CurveError::Overflow)?,
            exponent,
        })
    }

    fn floor_log2(&self) -> Result<u128, CurveError> {
        self.exponent
            .checked_add(self.mantissa.bits() as u128 - 1)
            .ok_or(CurveError::Overflow)
    }
}

/// A curve as published for one (provider, specifier) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSpec {
    pub curve_type: CurveType,
    /// Maximum number of dots that may ever be outstanding on this curve
    pub max_dots: DotCount,
}

impl CurveSpec {
    /// Wrap a curve type with the default ceiling
    pub fn new(curve_type: CurveType) -> Self {
        Self {
            curve_type,
            max_dots: DEFAULT_DOT_CEILING,
        }
    }

    pub fn with_max_dots(mut self, max_dots: DotCount) -> Self {
        self.max_dots = max_dots;
        self
    }

    pub fn uninitialized() -> Self {
        Self::new(CurveType::None)
    }

    pub fn linear(start: Amount, multiplier: Amount) -> Self {
        Self::new(CurveType::Linear { start, multiplier })
    }

    pub fn exponential(start: Amount, multiplier: Amount) -> Self {
        Self::new(CurveType::Exponential { start, multiplier })
    }

    pub fn logarithmic(start: Amount, multiplier: Amount) -> Self {
        Self::new(CurveType::Logarithmic { start, multiplier })
    }

    pub fn piecewise(constants: &[u64], parts: &[u64], dividers: &[u64]) -> Result<Self, CurveError> {
        CurveType::from_piecewise(constants, parts, dividers).map(Self::new)
    }

    pub fn is_initialized(&self) -> bool {
        self.curve_type.is_initialized()
    }
}
