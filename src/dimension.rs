//! Dimension exponent vectors.
//!
//! Every unit has dimensions in the 7 fundamental measures. A vector stores the
//! exponent of each measure; slices shorter than 7 are implicitly zero-padded.
//!
//! Order of the slots:
//! - L: Length
//! - M: Mass
//! - T: Time
//! - I: Electric current
//! - Θ: Thermodynamic temperature
//! - N: Amount of substance
//! - J: Luminous intensity

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Number of fundamental measures.
pub const MEASURE_COUNT: usize = 7;

/// The fundamental measures, in dimension-vector slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    Length,
    Mass,
    Time,
    ElectricCurrent,
    ThermodynamicTemperature,
    AmountOfSubstance,
    LuminousIntensity,
}

impl Measure {
    pub const ALL: [Measure; MEASURE_COUNT] = [
        Measure::Length,
        Measure::Mass,
        Measure::Time,
        Measure::ElectricCurrent,
        Measure::ThermodynamicTemperature,
        Measure::AmountOfSubstance,
        Measure::LuminousIntensity,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short dimension symbol used by `Display` of a vector.
    pub fn symbol(self) -> &'static str {
        match self {
            Measure::Length => "L",
            Measure::Mass => "M",
            Measure::Time => "T",
            Measure::ElectricCurrent => "I",
            Measure::ThermodynamicTemperature => "Θ",
            Measure::AmountOfSubstance => "N",
            Measure::LuminousIntensity => "J",
        }
    }
}

// ============================================================================
// Slice algebra
// ============================================================================

/// Elementwise comparison with implicit zero-extension of the shorter slice.
pub fn equals(a: &[i8], b: &[i8]) -> bool {
    let common = a.len().min(b.len());
    if a[..common] != b[..common] {
        return false;
    }
    let tail = if a.len() > b.len() { &a[common..] } else { &b[common..] };
    tail.iter().all(|&e| e == 0)
}

pub fn is_dimensionless(v: &[i8]) -> bool {
    v.iter().all(|&e| e == 0)
}

/// Number of measures with a nonzero exponent.
pub fn dimension_count(v: &[i8]) -> usize {
    v.iter().filter(|&&e| e != 0).count()
}

// ============================================================================
// DimensionVector
// ============================================================================

/// A fixed 7-slot exponent vector. Immutable value type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DimensionVector([i8; MEASURE_COUNT]);

impl DimensionVector {
    pub const DIMENSIONLESS: Self = Self([0; MEASURE_COUNT]);

    pub const fn new(exponents: [i8; MEASURE_COUNT]) -> Self {
        Self(exponents)
    }

    /// Build from a possibly shorter slice, zero-padding the tail.
    ///
    /// Panics if the slice holds more than 7 exponents.
    pub fn from_slice(exponents: &[i8]) -> Self {
        Self::try_from_slice(exponents).unwrap_or_else(|| {
            panic!(
                "dimension vector holds at most {MEASURE_COUNT} exponents, got {}",
                exponents.len()
            )
        })
    }

    pub fn try_from_slice(exponents: &[i8]) -> Option<Self> {
        if exponents.len() > MEASURE_COUNT {
            return None;
        }
        let mut v = [0; MEASURE_COUNT];
        v[..exponents.len()].copy_from_slice(exponents);
        Some(Self(v))
    }

    /// Unit basis vector for one measure slot.
    pub fn basis(index: usize) -> Self {
        assert!(index < MEASURE_COUNT, "measure index {index} out of range");
        let mut v = [0; MEASURE_COUNT];
        v[index] = 1;
        Self(v)
    }

    pub fn of(measure: Measure) -> Self {
        Self::basis(measure.index())
    }

    pub fn exponents(&self) -> &[i8; MEASURE_COUNT] {
        &self.0
    }

    pub fn get(&self, measure: Measure) -> i8 {
        self.0[measure.index()]
    }

    pub fn is_dimensionless(&self) -> bool {
        is_dimensionless(&self.0)
    }

    pub fn dimension_count(&self) -> usize {
        dimension_count(&self.0)
    }

    /// The slot index when exactly one measure has exponent 1 and all others are 0.
    pub fn single_base_index(&self) -> Option<usize> {
        if self.dimension_count() != 1 {
            return None;
        }
        self.0.iter().position(|&e| e == 1)
    }

    /// Multiply every exponent by `n`; `None` on i8 overflow.
    pub fn pow(&self, n: i8) -> Option<Self> {
        let mut v = [0; MEASURE_COUNT];
        for (out, &e) in v.iter_mut().zip(self.0.iter()) {
            *out = e.checked_mul(n)?;
        }
        Some(Self(v))
    }

    /// Divide every exponent by `n`. `None` if any exponent is not divisible
    /// (or `n` is not positive): the root is not representable.
    pub fn root(&self, n: i8) -> Option<Self> {
        if n <= 0 {
            return None;
        }
        let mut v = [0; MEASURE_COUNT];
        for (out, &e) in v.iter_mut().zip(self.0.iter()) {
            if e % n != 0 {
                return None;
            }
            *out = e / n;
        }
        Some(Self(v))
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut v = [0; MEASURE_COUNT];
        for i in 0..MEASURE_COUNT {
            v[i] = self.0[i].checked_add(other.0[i])?;
        }
        Some(Self(v))
    }

    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let mut v = [0; MEASURE_COUNT];
        for i in 0..MEASURE_COUNT {
            v[i] = self.0[i].checked_sub(other.0[i])?;
        }
        Some(Self(v))
    }

    pub fn checked_neg(&self) -> Option<Self> {
        let mut v = [0; MEASURE_COUNT];
        for (out, &e) in v.iter_mut().zip(self.0.iter()) {
            *out = e.checked_neg()?;
        }
        Some(Self(v))
    }

    /// Nonzero (measure index, exponent) pairs in slot order.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, i8)> + '_ {
        self.0.iter().enumerate().filter(|(_, e)| **e != 0).map(|(i, e)| (i, *e))
    }
}

impl Index<Measure> for DimensionVector {
    type Output = i8;

    fn index(&self, measure: Measure) -> &i8 {
        &self.0[measure.index()]
    }
}

impl From<[i8; MEASURE_COUNT]> for DimensionVector {
    fn from(v: [i8; MEASURE_COUNT]) -> Self {
        Self(v)
    }
}

impl PartialEq<[i8]> for DimensionVector {
    fn eq(&self, other: &[i8]) -> bool {
        equals(&self.0, other)
    }
}

impl fmt::Debug for DimensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DimensionVector({self})")
    }
}

impl fmt::Display for DimensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut first = true;
        for (i, e) in self.nonzero() {
            if !first {
                write!(f, "·")?;
            }
            first = false;
            write!(f, "{}", Measure::ALL[i].symbol())?;
            if e != 1 {
                write!(f, "^{e}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded_equality() {
        assert!(equals(&[1, 0, -2], &[1, 0, -2, 0, 0, 0, 0]));
        assert!(equals(&[1, 0, -2, 0], &[1, 0, -2]));
        assert!(!equals(&[1, 0, -2, 1], &[1, 0, -2]));
        assert!(equals(&[], &[0, 0]));
    }

    #[test]
    fn test_counts() {
        assert!(is_dimensionless(&[0, 0, 0]));
        assert_eq!(dimension_count(&[1, 1, -2]), 3);
        let force = DimensionVector::from_slice(&[1, 1, -2]);
        assert_eq!(force.dimension_count(), 3);
        assert_eq!(force.single_base_index(), None);
        assert_eq!(DimensionVector::of(Measure::Time).single_base_index(), Some(2));
    }

    #[test]
    fn test_root_not_representable() {
        let area = DimensionVector::from_slice(&[2]);
        assert_eq!(area.root(2), Some(DimensionVector::basis(0)));
        let velocity = DimensionVector::from_slice(&[1, 0, -1]);
        assert_eq!(velocity.root(2), None);
        assert_eq!(velocity.root(0), None);
    }

    #[test]
    fn test_pow_overflow() {
        let v = DimensionVector::from_slice(&[100]);
        assert_eq!(v.pow(2), None);
        assert_eq!(v.pow(-1), Some(DimensionVector::from_slice(&[-100])));
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let big = DimensionVector::from_slice(&[100, 0, -100]);
        assert_eq!(big.checked_add(&big), None);
        assert_eq!(big.checked_sub(&big), Some(DimensionVector::DIMENSIONLESS));
        assert_eq!(DimensionVector::from_slice(&[-128]).checked_neg(), None);
        assert_eq!(big.checked_neg(), Some(DimensionVector::from_slice(&[-100, 0, 100])));
    }

    #[test]
    fn test_display() {
        assert_eq!(DimensionVector::from_slice(&[1, 1, -2]).to_string(), "L·M·T^-2");
        assert_eq!(DimensionVector::DIMENSIONLESS.to_string(), "1");
    }

    #[test]
    #[should_panic(expected = "at most 7")]
    fn test_too_long_rejected() {
        DimensionVector::from_slice(&[0; 8]);
    }
}
