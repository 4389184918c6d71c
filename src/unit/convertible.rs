//! Convertible units: a scalar/offset transform away from a primary unit.

use crate::value_conversion::ValueConversion;

use super::Unit;

/// A unit related to a primary unit by a [`ValueConversion`]
/// (gram ⇄ kilogram, Celsius ⇄ kelvin).
///
/// The conversion maps a value in the primary unit to a value in this unit
/// when applied forwards.
#[derive(Debug)]
pub struct ConvertibleUnit {
    name: String,
    symbol: String,
    primary: Unit,
    conversion: ValueConversion,
}

impl ConvertibleUnit {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        primary: Unit,
        conversion: ValueConversion,
    ) -> Self {
        Self { name: name.into(), symbol: symbol.into(), primary, conversion }
    }

    /// Anonymous unit worth `factor` of `unit`. Carries residual scale factors
    /// that a combined unit cannot hold as a prefix.
    pub(crate) fn scaled(unit: Unit, factor: f64) -> Self {
        let symbol = format!("{factor}·{}", unit.to_unit_string());
        Self {
            name: String::new(),
            symbol,
            primary: unit,
            conversion: ValueConversion::scaled(1.0 / factor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn primary(&self) -> &Unit {
        &self.primary
    }

    pub fn conversion(&self) -> &ValueConversion {
        &self.conversion
    }

    /// Value in this unit of `value` expressed in the primary unit.
    pub fn from_primary(&self, value: f64) -> f64 {
        self.conversion.convert(value, false)
    }

    /// Value in the primary unit of `value` expressed in this unit.
    pub fn to_primary(&self, value: f64) -> f64 {
        self.conversion.convert(value, true)
    }
}
