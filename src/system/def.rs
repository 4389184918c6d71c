//! Serializable unit-system definitions.
//!
//! ```json
//! {
//!   "name": "MGD",
//!   "base_units": [{ "name": "metre", "symbol": "m" }, ...],
//!   "named_derived_units": [{ "name": "newton", "symbol": "N", "exponents": [1, 1, -2] }],
//!   "convertible_units": [
//!     { "name": "kilogram", "symbol": "kg", "primary": "g",
//!       "conversion": { "kind": "scaled", "scale": 0.001 } }
//!   ]
//! }
//! ```
//!
//! A convertible unit's `primary` is either a symbol of the same system or an
//! exponent array naming the system's normalized unit for those dimensions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dimension::DimensionVector;
use crate::unit::Unit;
use crate::value_conversion::ValueConversion;
use crate::{Error, Result};

use super::{PrimaryUnit, UnitSystem, UnitSystemBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSystemDef {
    pub name: String,
    #[serde(default)]
    pub base_units: Vec<UnitDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named_derived_units: Vec<NamedDerivedUnitDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub convertible_units: Vec<ConvertibleUnitDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDef {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDerivedUnitDef {
    pub name: String,
    pub symbol: String,
    pub exponents: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertibleUnitDef {
    pub name: String,
    pub symbol: String,
    pub primary: PrimaryDef,
    pub conversion: ValueConversion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryDef {
    Symbol(String),
    Exponents(Vec<i8>),
}

fn dimensions(symbol: &str, exponents: &[i8]) -> Result<DimensionVector> {
    DimensionVector::try_from_slice(exponents).ok_or_else(|| {
        Error::Definition(format!("unit '{symbol}' has {} exponents, at most 7 allowed", exponents.len()))
    })
}

impl UnitSystemDef {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build(&self) -> Result<Arc<UnitSystem>> {
        let mut builder = UnitSystemBuilder::new(&self.name);
        for u in &self.base_units {
            builder = builder.base_unit(&u.name, &u.symbol);
        }
        for u in &self.named_derived_units {
            let dims = dimensions(&u.symbol, &u.exponents)?;
            builder = builder.named_derived_unit(&u.name, &u.symbol, dims.exponents());
        }
        for u in &self.convertible_units {
            let primary = match &u.primary {
                PrimaryDef::Symbol(symbol) => PrimaryUnit::Symbol(symbol.clone()),
                PrimaryDef::Exponents(exponents) => {
                    PrimaryUnit::Dimensions(dimensions(&u.symbol, exponents)?)
                }
            };
            builder = builder.convertible_unit(&u.name, &u.symbol, primary, u.conversion.clone());
        }
        builder.try_build()
    }

    /// Describe an existing system. Primaries outside the system, or without a
    /// symbol, are written as exponent arrays.
    pub fn from_system(system: &UnitSystem) -> Self {
        let trimmed = |dims: DimensionVector| {
            let exps = dims.exponents();
            let len = exps.iter().rposition(|&e| e != 0).map_or(0, |i| i + 1);
            exps[..len].to_vec()
        };
        let base_units = system
            .base_units()
            .iter()
            .filter_map(|u| Some(UnitDef { name: u.name()?.to_string(), symbol: u.symbol()?.to_string() }))
            .collect();
        let named_derived_units = system
            .named_derived_units()
            .iter()
            .filter_map(|u| {
                Some(NamedDerivedUnitDef {
                    name: u.name()?.to_string(),
                    symbol: u.symbol()?.to_string(),
                    exponents: trimmed(u.dimensions()),
                })
            })
            .collect();
        let convertible_units = system
            .convertible_units()
            .iter()
            .filter_map(|u| {
                let Unit::Convertible(c) = u else { return None };
                let primary = c.primary();
                let in_system = primary.system_ref().is_some_and(|s| s.is(system));
                let primary = match primary.symbol() {
                    Some(symbol) if in_system => PrimaryDef::Symbol(symbol.to_string()),
                    _ => PrimaryDef::Exponents(trimmed(primary.dimensions())),
                };
                Some(ConvertibleUnitDef {
                    name: c.name().to_string(),
                    symbol: c.symbol().to_string(),
                    primary,
                    conversion: c.conversion().clone(),
                })
            })
            .collect();
        Self { name: system.name().to_string(), base_units, named_derived_units, convertible_units }
    }
}
