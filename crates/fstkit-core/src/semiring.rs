// Semiring weights.
//
// Both semirings store a single f32 in the "negative log" domain: `zero` is
// +inf, `one` is 0.0 and `times` is addition. They differ in `plus`:
// tropical takes the minimum, log takes -ln(e^-a + e^-b).

use std::fmt;

use crate::FstError;

/// Default comparison and quantization delta.
pub const DELTA: f32 = 1.0 / 1024.0;

/// Identifies the semiring of a weight type. Stored in binary headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemiringKind {
    Tropical,
    Log,
}

impl SemiringKind {
    pub fn name(self) -> &'static str {
        match self {
            SemiringKind::Tropical => "tropical",
            SemiringKind::Log => "log",
        }
    }

    pub fn type_code(self) -> u8 {
        match self {
            SemiringKind::Tropical => 1,
            SemiringKind::Log => 2,
        }
    }

    pub fn from_type_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SemiringKind::Tropical),
            2 => Some(SemiringKind::Log),
            _ => None,
        }
    }
}

/// A commutative weight semiring over negative-log costs.
///
/// The natural order used by pruning and path search is the order of the
/// underlying values: smaller is better, `zero()` is the worst.
pub trait Semiring:
    Copy + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static
{
    const KIND: SemiringKind;

    /// Identity of `plus`, annihilator of `times`.
    fn zero() -> Self;

    /// Identity of `times`.
    fn one() -> Self;

    fn plus(&self, rhs: &Self) -> Self;

    fn times(&self, rhs: &Self) -> Self;

    /// Left division: the `x` with `rhs ⊗ x = self`. `None` when `rhs` is zero.
    fn divide(&self, rhs: &Self) -> Option<Self>;

    /// Underlying cost.
    fn value(&self) -> f32;

    /// Wrap a raw value without domain checks.
    fn from_value(value: f32) -> Self;

    /// Checked constructor. NaN and -inf are rejected.
    fn new(value: f32) -> Result<Self, FstError> {
        if value.is_nan() || value == f32::NEG_INFINITY {
            return Err(FstError::InvalidWeight(value));
        }
        Ok(Self::from_value(value))
    }

    fn name() -> &'static str {
        Self::KIND.name()
    }

    /// True if the value is inside the semiring domain.
    fn is_member(&self) -> bool {
        let v = self.value();
        !v.is_nan() && v != f32::NEG_INFINITY
    }

    fn is_zero(&self) -> bool {
        self.value() == f32::INFINITY
    }

    fn is_one(&self) -> bool {
        self.value() == 0.0
    }

    /// Natural order: `self` is strictly better than `other`.
    fn less(&self, other: &Self) -> bool {
        self.value() < other.value()
    }

    /// Equality within `delta`. Two zeros are equal.
    fn approx_eq(&self, other: &Self, delta: f32) -> bool {
        let (a, b) = (self.value(), other.value());
        if a == b {
            return true;
        }
        (a - b).abs() <= delta
    }

    /// Round to the nearest multiple of `delta`. Zero is unchanged.
    fn quantize(&self, delta: f32) -> Self {
        let v = self.value();
        if !v.is_finite() {
            return *self;
        }
        Self::from_value((v / delta + 0.5).floor() * delta)
    }

    /// Hashable key for the quantized value. Folds -0.0 into 0.0.
    fn quantized_key(&self, delta: f32) -> u32 {
        let q = self.quantize(delta).value();
        if q == 0.0 { 0 } else { q.to_bits() }
    }
}

/// Re-interpret a weight in another semiring. Fails when the value is not a
/// member of the target domain.
pub fn convert_weight<W1: Semiring, W2: Semiring>(w: W1) -> Result<W2, FstError> {
    W2::new(w.value()).map_err(|_| FstError::IncompatibleSemiring {
        expected: W2::name().to_string(),
        actual: format!("{} value {}", W1::name(), w.value()),
    })
}

fn write_value(f: &mut fmt::Formatter<'_>, v: f32) -> fmt::Result {
    if v == f32::INFINITY {
        f.write_str("Infinity")
    } else {
        write!(f, "{v}")
    }
}

/// Tropical weight: `plus` is min, `times` is +.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TropicalWeight(f32);

impl Semiring for TropicalWeight {
    const KIND: SemiringKind = SemiringKind::Tropical;

    #[inline]
    fn zero() -> Self {
        TropicalWeight(f32::INFINITY)
    }

    #[inline]
    fn one() -> Self {
        TropicalWeight(0.0)
    }

    #[inline]
    fn plus(&self, rhs: &Self) -> Self {
        if rhs.0 < self.0 { *rhs } else { *self }
    }

    #[inline]
    fn times(&self, rhs: &Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        TropicalWeight(self.0 + rhs.0)
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Self::zero());
        }
        Some(TropicalWeight(self.0 - rhs.0))
    }

    #[inline]
    fn value(&self) -> f32 {
        self.0
    }

    #[inline]
    fn from_value(value: f32) -> Self {
        TropicalWeight(value)
    }
}

impl From<f32> for TropicalWeight {
    fn from(value: f32) -> Self {
        TropicalWeight(value)
    }
}

impl Default for TropicalWeight {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for TropicalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0)
    }
}

/// Log weight: `plus` is -ln(e^-a + e^-b), `times` is +.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogWeight(f32);

impl Semiring for LogWeight {
    const KIND: SemiringKind = SemiringKind::Log;

    #[inline]
    fn zero() -> Self {
        LogWeight(f32::INFINITY)
    }

    #[inline]
    fn one() -> Self {
        LogWeight(0.0)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if self.is_zero() {
            return *rhs;
        }
        if rhs.is_zero() {
            return *self;
        }
        let (lo, hi) = if self.0 < rhs.0 { (self.0, rhs.0) } else { (rhs.0, self.0) };
        LogWeight(lo - (lo - hi).exp().ln_1p())
    }

    #[inline]
    fn times(&self, rhs: &Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        LogWeight(self.0 + rhs.0)
    }

    fn divide(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Self::zero());
        }
        Some(LogWeight(self.0 - rhs.0))
    }

    #[inline]
    fn value(&self) -> f32 {
        self.0
    }

    #[inline]
    fn from_value(value: f32) -> Self {
        LogWeight(value)
    }
}

impl From<f32> for LogWeight {
    fn from(value: f32) -> Self {
        LogWeight(value)
    }
}

impl Default for LogWeight {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for LogWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0)
    }
}
