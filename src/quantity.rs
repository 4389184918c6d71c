//! Physical quantities: a value paired with a unit.
//!
//! Quantities are plain values. Every operation returns a new quantity.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, Neg};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::{UnitCatalog, UnitContext};
use crate::format::NumberLocale;
use crate::system::UnitSystem;
use crate::unit::{ConvertibleUnit, Unit};
use crate::{Error, Result, parser};

/// Relative tolerance for quantity equality.
pub const REL_TOLERANCE: f64 = 1e-15;

/// `|a - b| <= 1e-15 · max(|a|, |b|)`.
pub fn values_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs())
}

/// Real `n`-th root; odd roots of negative values stay negative.
pub(crate) fn nth_root(value: f64, n: i8) -> f64 {
    match n {
        1 => value,
        2 => value.sqrt(),
        3 => value.cbrt(),
        n if value < 0.0 && n % 2 != 0 => -(-value).powf(1.0 / f64::from(n)),
        n => value.powf(1.0 / f64::from(n)),
    }
}

#[derive(Clone)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn into_parts(self) -> (f64, Unit) {
        (self.value, self.unit)
    }

    /// Exactly one of its unit.
    pub fn is_pure_unit(&self) -> bool {
        self.value == 1.0
    }

    /// Turn a quantity into a unit: `1 u` is `u`, any other finite non-zero
    /// `v u` becomes an anonymous unit worth `v` of `u`.
    pub fn into_unit(self) -> Result<Unit> {
        let unit = match self.unit {
            Unit::Combined(c) => Arc::unwrap_or_clone(c).into_unit(),
            u => u,
        };
        if self.value == 1.0 {
            return Ok(unit);
        }
        if self.value.is_normal() && self.value.recip().is_normal() {
            return Ok(Unit::from(ConvertibleUnit::scaled(unit, self.value)));
        }
        Err(Error::UnitMath(format!("scale factor {} of {unit} is not representable", self.value)))
    }

    // ------------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------------

    pub fn convert_to(&self, to: &Unit, catalog: &UnitCatalog) -> Option<Quantity> {
        catalog.convert(self, to)
    }

    pub fn convert_to_system(&self, system: &UnitSystem, catalog: &UnitCatalog) -> Option<Quantity> {
        catalog.convert_to_system(self, system)
    }

    fn converted_like(&self, other: &Quantity, catalog: &UnitCatalog) -> Result<f64> {
        other.convert_to(&self.unit, catalog).map(|q| q.value).ok_or_else(|| Error::NotConvertible {
            from: other.unit.to_unit_string(),
            to: self.unit.to_unit_string(),
        })
    }

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    /// `self + other`, in `self`'s unit.
    pub fn add(&self, other: &Quantity, catalog: &UnitCatalog) -> Result<Quantity> {
        Ok(Quantity::new(self.value + self.converted_like(other, catalog)?, self.unit.clone()))
    }

    pub fn subtract(&self, other: &Quantity, catalog: &UnitCatalog) -> Result<Quantity> {
        Ok(Quantity::new(self.value - self.converted_like(other, catalog)?, self.unit.clone()))
    }

    /// Fails with [`Error::UnitMath`] when a unit exponent leaves the i8 range.
    pub fn multiply(&self, other: &Quantity) -> Result<Quantity> {
        let u = self.unit.multiply(&other.unit)?;
        Ok(Quantity::new(self.value * other.value * u.value, u.unit))
    }

    pub fn divide(&self, other: &Quantity) -> Result<Quantity> {
        let u = self.unit.divide(&other.unit)?;
        Ok(Quantity::new(self.value / other.value * u.value, u.unit))
    }

    pub fn scale(&self, factor: f64) -> Quantity {
        Quantity::new(self.value * factor, self.unit.clone())
    }

    pub fn pow(&self, n: i8) -> Result<Quantity> {
        let u = self.unit.pow(n)?;
        Ok(Quantity::new(self.value.powi(i32::from(n)) * u.value, u.unit))
    }

    pub fn root(&self, n: i8) -> Result<Quantity> {
        let u = self.unit.root(n)?;
        Ok(Quantity::new(nth_root(self.value, n) * u.value, u.unit))
    }

    // ------------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------------

    /// Equal after converting `other` into this quantity's unit.
    pub fn equivalent(&self, other: &Quantity, catalog: &UnitCatalog) -> bool {
        self.converted_like(other, catalog).is_ok_and(|v| values_equal(self.value, v))
    }

    pub fn try_cmp(&self, other: &Quantity, catalog: &UnitCatalog) -> Result<Ordering> {
        let v = self.converted_like(other, catalog)?;
        if values_equal(self.value, v) {
            return Ok(Ordering::Equal);
        }
        self.value
            .partial_cmp(&v)
            .ok_or_else(|| Error::UnitMath(format!("cannot order {} and {v}", self.value)))
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    pub fn value_string(&self, format: Option<&str>, locale: Option<&NumberLocale>) -> String {
        self.unit.value_string(self.value, format, locale)
    }

    /// Value and system-qualified unit, `5 SI.kg`. Parses back with [`Quantity::parse`].
    pub fn to_print_string(&self) -> String {
        let (value, unit) = self.textual();
        join(unit.value_string(value, None, None), unit.to_print_string())
    }

    /// Value and unit as written out. An anonymous scaled unit has no symbol,
    /// so its factor moves into the value: `2 (1000·m^2)` is written `2000 m^2`.
    fn textual(&self) -> (f64, &Unit) {
        let (mut value, mut unit) = (self.value, &self.unit);
        while let Unit::Convertible(c) = unit {
            if !c.name().is_empty() || c.conversion().has_offset() {
                break;
            }
            value = c.to_primary(value);
            unit = c.primary();
        }
        (value, unit)
    }

    pub fn parse(text: &str) -> Result<Quantity> {
        parser::parse_quantity(text, &UnitContext::standard())
    }
}

fn join(value: String, unit: String) -> String {
    if unit.is_empty() { value } else { format!("{value} {unit}") }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, unit) = self.textual();
        f.write_str(&join(unit.value_string(value, None, None), unit.to_unit_string()))
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({} {})", self.value, self.unit.to_print_string())
    }
}

/// Equality against the standard catalog. Use [`Quantity::equivalent`] for others.
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other, UnitCatalog::standard())
    }
}

/// `None` for quantities whose units do not convert into each other.
impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other, UnitCatalog::standard()).ok()
    }
}

/// # Panics
///
/// When a unit exponent leaves the i8 range. [`Quantity::multiply`] reports
/// that as an error instead.
impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        self.multiply(&rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        self.scale(rhs)
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        rhs.scale(self)
    }
}

/// # Panics
///
/// When a unit exponent leaves the i8 range. [`Quantity::divide`] reports
/// that as an error instead.
impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        self.divide(&rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        self.scale(1.0 / rhs)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.unit)
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Quantity::parse(s)
    }
}

// ============================================================================
// Serde
// ============================================================================

#[derive(Serialize, Deserialize)]
struct QuantityRepr {
    value: f64,
    unit: String,
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (value, unit) = self.textual();
        QuantityRepr { value, unit: unit.to_print_string() }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = QuantityRepr::deserialize(deserializer)?;
        let ctx = UnitContext::standard();
        let unit = if repr.unit.trim().is_empty() {
            ctx.dimensionless()
        } else {
            parser::parse_unit(&repr.unit, &ctx).map_err(serde::de::Error::custom)?
        };
        Ok(Quantity::new(repr.value, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn q(text: &str) -> Quantity {
        text.parse().unwrap()
    }

    #[test]
    fn test_tolerance() {
        assert!(values_equal(1.0, 1.0 + 1e-16));
        assert!(!values_equal(1.0, 1.0 + 1e-14));
        assert!(values_equal(0.0, 0.0));
        assert!(!values_equal(0.0, 1e-300));
    }

    #[test]
    fn test_add_converts_right_operand() {
        let c = UnitCatalog::standard();
        let sum = q("1 km").add(&q("500 m"), c).unwrap();
        assert_eq!(sum.value(), 1.5);
        assert_eq!(sum.unit().to_unit_string(), "km");
        let diff = q("1 kg").subtract(&q("250 g"), c).unwrap();
        assert_eq!(diff.value(), 0.75);
    }

    #[test]
    fn test_add_incompatible() {
        let err = q("1 m").add(&q("1 s"), UnitCatalog::standard()).unwrap_err();
        assert!(matches!(err, Error::NotConvertible { .. }));
    }

    #[test]
    fn test_multiply_and_divide() {
        let work = q("2 N") * q("3 m");
        assert_eq!(work.value(), 6.0);
        assert!(work == q("6 J"));
        let speed = q("100 km") / q("2 h");
        assert!(speed == q("50 km/h"));
        assert_eq!((q("2 m") * 3.0).value(), 6.0);
        assert_eq!((-q("2 m")).value(), -2.0);
    }

    #[test]
    fn test_pow_root() {
        let area = q("3 m").pow(2).unwrap();
        assert_eq!(area.value(), 9.0);
        assert!(area == q("9 m^2"));
        let side = area.root(2).unwrap();
        assert!(side == q("3 m"));
        let cube = q("-8 m^3").root(3).unwrap();
        assert_eq!(cube.value(), -2.0);
    }

    #[test]
    fn test_ordering() {
        assert!(q("1 km") > q("999 m"));
        assert!(q("1 g") < q("1 kg"));
        assert_eq!(q("1 m").partial_cmp(&q("1 s")), None);
        assert!(matches!(
            q("1 m").try_cmp(&q("1 s"), UnitCatalog::standard()),
            Err(Error::NotConvertible { .. })
        ));
    }

    #[test]
    fn test_into_unit() {
        let u = q("1 m").into_unit().unwrap();
        assert_eq!(u.to_unit_string(), "m");
        let scaled = q("1000 m").into_unit().unwrap();
        assert!(scaled == q("1 km").into_unit().unwrap());
        assert!(matches!(q("0 m").into_unit(), Err(Error::UnitMath(_))));
    }

    #[test]
    fn test_display_and_print() {
        assert_eq!(q("5 kg").to_string(), "5 kg");
        assert_eq!(q("5 kg").to_print_string(), "5 SI.kg");
        assert_eq!(q("1.5 km/h").to_print_string(), "1.5 SI.km/SI.h");
        assert_eq!(q("3").to_string(), "3");
    }

    #[test]
    fn test_serde_round_trip() {
        let original = q("9.81 m/s^2");
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#"{"value":9.81,"unit":"SI.m/SI.s^2"}"#);
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert!(back == original);
        assert!(back.unit().same_unit(original.unit()));
    }

    #[test]
    fn test_scaled_unit_written_through_its_primary() {
        let area = q("1 m^2").unit().clone();
        let scaled = Quantity::new(2.0, area.combine_prefix(3).unwrap());
        assert_eq!(scaled.unit().kind(), crate::UnitKind::Convertible);
        assert_eq!(scaled.to_print_string(), "2000 SI.m^2");
        assert_eq!(scaled.to_string(), "2000 m^2");

        let json = serde_json::to_string(&scaled).unwrap();
        assert_eq!(json, r#"{"value":2000.0,"unit":"SI.m^2"}"#);
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert!(back == scaled);
        assert!(q(&scaled.to_print_string()) == scaled);
    }

    #[test]
    fn test_multiply_reports_exponent_overflow() {
        let big = q("1 m^100");
        assert!(matches!(big.multiply(&big), Err(Error::UnitMath(_))));
        assert!(matches!(big.divide(&q("1 m^-100")), Err(Error::UnitMath(_))));
    }
}
