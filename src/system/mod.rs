//! Unit systems.
//!
//! A system is a named, closed catalog of base, named-derived and convertible
//! units sharing one prefix table. Systems are built once through
//! [`UnitSystemBuilder`] (or a [`UnitSystemDef`](def::UnitSystemDef) loaded from
//! JSON) and are immutable afterwards.
//!
//! Building is two-phase: the builder collects unattached descriptions, then
//! `build` allocates the system with `Arc::new_cyclic` so every unit is created
//! already bound to its system. There is no way to re-attach a unit later.

pub mod conversion;
pub mod def;

use std::fmt;
use std::sync::{Arc, Weak};

use crate::dimension::{DimensionVector, MEASURE_COUNT};
use crate::prefix::UnitPrefixTable;
use crate::quantity::Quantity;
use crate::unit::{BaseUnit, ConvertibleUnit, DerivedUnit, SystemRef, Unit};
use crate::value_conversion::ValueConversion;
use crate::{Error, Result};

pub use conversion::UnitSystemConversion;
pub use def::UnitSystemDef;

// ============================================================================
// UnitSystem
// ============================================================================

pub struct UnitSystem {
    name: Arc<str>,
    me: Weak<UnitSystem>,
    prefixes: &'static UnitPrefixTable,
    base_units: Vec<Unit>,
    named_derived_units: Vec<Unit>,
    convertible_units: Vec<Unit>,
    dimensionless: Unit,
}

impl UnitSystem {
    pub fn builder(name: impl Into<String>) -> UnitSystemBuilder {
        UnitSystemBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefixes(&self) -> &'static UnitPrefixTable {
        self.prefixes
    }

    pub fn system_ref(&self) -> SystemRef {
        SystemRef::new(self.name.clone(), self.me.clone())
    }

    /// Base units in measure-slot order.
    pub fn base_units(&self) -> &[Unit] {
        &self.base_units
    }

    pub fn named_derived_units(&self) -> &[Unit] {
        &self.named_derived_units
    }

    pub fn convertible_units(&self) -> &[Unit] {
        &self.convertible_units
    }

    pub fn dimensionless(&self) -> &Unit {
        &self.dimensionless
    }

    /// Every named unit in lookup order: base, named derived, convertible.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.base_units
            .iter()
            .chain(self.named_derived_units.iter())
            .chain(self.convertible_units.iter())
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// Case-insensitive name lookup. Base units win over derived, derived over
    /// convertible.
    pub fn unit_from_name(&self, name: &str) -> Option<Unit> {
        let wanted = name.to_lowercase();
        self.units().find(|u| u.name().is_some_and(|n| n.to_lowercase() == wanted)).cloned()
    }

    /// Case-sensitive symbol lookup, same order as [`unit_from_name`](Self::unit_from_name).
    pub fn unit_from_symbol(&self, symbol: &str) -> Option<Unit> {
        self.units().find(|u| u.symbol() == Some(symbol)).cloned()
    }

    /// Symbol lookup that also accepts a single-character prefix (`km`, `μs`).
    /// An exact symbol always wins, so `cd` is candela and `min` is minute.
    pub fn scaled_unit_from_symbol(&self, symbol: &str) -> Option<Unit> {
        if let Some(unit) = self.unit_from_symbol(symbol) {
            return Some(unit);
        }
        let mut chars = symbol.chars();
        let prefix = chars.next()?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return None;
        }
        let exponent = self.prefixes.exponent_of(prefix)?;
        self.unit_from_symbol(rest)?.combine_prefix(exponent).ok()
    }

    /// The named derived unit matching a pure unit quantity (value exactly 1)
    /// spanning more than one dimension.
    pub fn named_derived_unit_from_unit(&self, quantity: &Quantity) -> Option<Unit> {
        if quantity.value() != 1.0 {
            return None;
        }
        let dims = quantity.unit().dimensions();
        if dims.dimension_count() <= 1 {
            return None;
        }
        self.named_derived_for(dims)
    }

    fn named_derived_for(&self, dims: DimensionVector) -> Option<Unit> {
        self.named_derived_units.iter().find(|u| u.dimensions() == dims).cloned()
    }

    /// The system's normalized unit for `dims`: the base unit for a single
    /// first-power dimension, else a named derived unit, else an anonymous one.
    pub fn unit_from_dimensions(&self, dims: DimensionVector) -> Unit {
        if dims.is_dimensionless() {
            return self.dimensionless.clone();
        }
        if let Some(base) = dims.single_base_index().and_then(|i| self.base_units.get(i)) {
            return base.clone();
        }
        self.named_derived_for(dims).unwrap_or_else(|| self.anonymous(dims))
    }

    /// Like [`unit_from_dimensions`](Self::unit_from_dimensions) but never uses
    /// a named derived unit.
    pub fn base_unit_for(&self, dims: DimensionVector) -> Unit {
        if dims.is_dimensionless() {
            return self.dimensionless.clone();
        }
        match dims.single_base_index().and_then(|i| self.base_units.get(i)) {
            Some(base) => base.clone(),
            None => self.anonymous(dims),
        }
    }

    fn anonymous(&self, dims: DimensionVector) -> Unit {
        Unit::Derived(Arc::new(DerivedUnit::anonymous(self.system_ref(), dims)))
    }

    pub fn from_json(json: &str) -> Result<Arc<UnitSystem>> {
        UnitSystemDef::from_json(json)?.build()
    }
}

impl fmt::Debug for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitSystem")
            .field("name", &self.name)
            .field("base_units", &self.base_units.len())
            .field("named_derived_units", &self.named_derived_units.len())
            .field("convertible_units", &self.convertible_units.len())
            .finish()
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// How a convertible unit names its primary unit.
#[derive(Debug, Clone)]
pub enum PrimaryUnit {
    /// A symbol of the system being built (`kg`, `Pa`, or an earlier convertible).
    Symbol(String),
    /// The system's normalized unit for these dimensions (`[3]` for volume).
    Dimensions(DimensionVector),
    /// Any existing unit, possibly from another system.
    Unit(Unit),
}

impl From<&str> for PrimaryUnit {
    fn from(symbol: &str) -> Self {
        PrimaryUnit::Symbol(symbol.to_string())
    }
}

impl From<DimensionVector> for PrimaryUnit {
    fn from(dims: DimensionVector) -> Self {
        PrimaryUnit::Dimensions(dims)
    }
}

impl From<Unit> for PrimaryUnit {
    fn from(unit: Unit) -> Self {
        PrimaryUnit::Unit(unit)
    }
}

#[derive(Debug, Clone)]
struct PendingConvertible {
    name: String,
    symbol: String,
    primary: PrimaryUnit,
    conversion: ValueConversion,
}

/// Collects unit descriptions for one system.
#[derive(Debug, Clone)]
pub struct UnitSystemBuilder {
    name: String,
    prefixes: &'static UnitPrefixTable,
    base: Vec<(String, String)>,
    derived: Vec<(String, String, DimensionVector)>,
    convertible: Vec<PendingConvertible>,
}

impl UnitSystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefixes: UnitPrefixTable::si(),
            base: Vec::new(),
            derived: Vec::new(),
            convertible: Vec::new(),
        }
    }

    pub fn prefixes(mut self, prefixes: &'static UnitPrefixTable) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Next base unit. The n-th base unit defines measure slot n.
    pub fn base_unit(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.base.push((name.into(), symbol.into()));
        self
    }

    pub fn named_derived_unit(
        mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        exponents: &[i8],
    ) -> Self {
        self.derived.push((name.into(), symbol.into(), DimensionVector::from_slice(exponents)));
        self
    }

    pub fn convertible_unit(
        mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        primary: impl Into<PrimaryUnit>,
        conversion: ValueConversion,
    ) -> Self {
        self.convertible.push(PendingConvertible {
            name: name.into(),
            symbol: symbol.into(),
            primary: primary.into(),
            conversion,
        });
        self
    }

    /// Panics on an invalid description. Use [`try_build`](Self::try_build) for
    /// data that did not come from source code.
    pub fn build(self) -> Arc<UnitSystem> {
        self.try_build().unwrap_or_else(|e| panic!("invalid unit system: {e}"))
    }

    pub fn try_build(self) -> Result<Arc<UnitSystem>> {
        self.validate()?;
        let UnitSystemBuilder { name, prefixes, base, derived, convertible } = self;
        let name: Arc<str> = Arc::from(name);

        let mut failure = None;
        let system = Arc::new_cyclic(|me: &Weak<UnitSystem>| {
            let sys = SystemRef::new(name.clone(), me.clone());
            let base_units: Vec<Unit> = base
                .into_iter()
                .enumerate()
                .map(|(i, (n, s))| Unit::Base(Arc::new(BaseUnit::new(sys.clone(), i, n, s))))
                .collect();
            let named_derived_units: Vec<Unit> = derived
                .into_iter()
                .map(|(n, s, dims)| Unit::Derived(Arc::new(DerivedUnit::named(sys.clone(), dims, n, s))))
                .collect();

            let mut convertible_units: Vec<Unit> = Vec::with_capacity(convertible.len());
            for pending in convertible {
                let primary = match pending.primary {
                    PrimaryUnit::Unit(u) => Some(u),
                    PrimaryUnit::Symbol(symbol) => base_units
                        .iter()
                        .chain(named_derived_units.iter())
                        .chain(convertible_units.iter())
                        .find(|u| u.symbol() == Some(symbol.as_str()))
                        .cloned()
                        .or_else(|| {
                            failure.get_or_insert_with(|| {
                                format!("primary unit '{symbol}' of '{}' is not defined", pending.symbol)
                            });
                            None
                        }),
                    PrimaryUnit::Dimensions(dims) => Some(
                        match dims.single_base_index().and_then(|i| base_units.get(i)) {
                            Some(base) => base.clone(),
                            None => Unit::Derived(Arc::new(DerivedUnit::anonymous(sys.clone(), dims))),
                        },
                    ),
                };
                if let Some(primary) = primary {
                    convertible_units.push(Unit::from(ConvertibleUnit::new(
                        pending.name,
                        pending.symbol,
                        primary,
                        pending.conversion,
                    )));
                }
            }

            UnitSystem {
                dimensionless: Unit::Derived(Arc::new(DerivedUnit::anonymous(
                    sys,
                    DimensionVector::DIMENSIONLESS,
                ))),
                name: name.clone(),
                me: me.clone(),
                prefixes,
                base_units,
                named_derived_units,
                convertible_units,
            }
        });

        match failure {
            Some(message) => Err(Error::Definition(message)),
            None => Ok(system),
        }
    }

    fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(Error::Definition(message));
        if self.name.is_empty() {
            return fail("unit system name is empty".into());
        }
        if self.base.len() > MEASURE_COUNT {
            return fail(format!(
                "system '{}' defines {} base units, at most {MEASURE_COUNT} allowed",
                self.name,
                self.base.len()
            ));
        }
        let symbols = self
            .base
            .iter()
            .map(|(n, s)| (n, s))
            .chain(self.derived.iter().map(|(n, s, _)| (n, s)))
            .chain(self.convertible.iter().map(|c| (&c.name, &c.symbol)));
        for (name, symbol) in symbols {
            if name.is_empty() || symbol.is_empty() {
                return fail(format!("unit in system '{}' has an empty name or symbol", self.name));
            }
            if symbol.contains(|c: char| c.is_whitespace() || "*/^:().·⋅".contains(c)) {
                return fail(format!("unit symbol '{symbol}' contains an operator character"));
            }
        }
        for (_, symbol, dims) in &self.derived {
            if dims.is_dimensionless() {
                return fail(format!("named derived unit '{symbol}' has no dimensions"));
            }
        }
        Ok(())
    }
}
