//! The unit hierarchy.
//!
//! A [`Unit`] is a closed set of five variants, each behind an `Arc` so units
//! are cheap to clone and share across threads:
//!
//! - [`BaseUnit`]: one fundamental measure of a system (metre)
//! - [`DerivedUnit`]: an exponent vector in one system, optionally named (newton)
//! - [`ConvertibleUnit`]: a value transform away from a primary unit (gram, Celsius)
//! - [`CombinedUnit`]: a symbolic product of prefixed unit powers (`km/h`)
//! - [`MixedUnit`]: a display chain such as `h:min`
//!
//! Units never change after their system is built. Operations produce new units.

pub mod base;
pub mod combined;
pub mod convertible;
pub mod derived;
pub mod mixed;

use std::fmt;
use std::sync::{Arc, Weak};

use crate::catalog::UnitCatalog;
use crate::catalog::convert::Converter;
use crate::dimension::DimensionVector;
use crate::format::{NumberLocale, format_value};
use crate::quantity::{Quantity, nth_root, values_equal};
use crate::system::UnitSystem;
use crate::{Error, Result};

pub use base::BaseUnit;
pub use combined::{CombinedUnit, PrefixedUnitExponent};
pub use convertible::ConvertibleUnit;
pub use derived::{DerivedUnit, UnitNaming};
pub use mixed::MixedUnit;

// ============================================================================
// SystemRef
// ============================================================================

/// Non-owning handle from a unit back to the system that defines it.
///
/// Systems own their units; units point back weakly so the graph has no cycle.
/// The name is kept alongside so a unit can render itself even if the system
/// has been dropped.
#[derive(Clone)]
pub struct SystemRef {
    name: Arc<str>,
    system: Weak<UnitSystem>,
}

impl SystemRef {
    pub(crate) fn new(name: Arc<str>, system: Weak<UnitSystem>) -> Self {
        Self { name, system }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upgrade(&self) -> Option<Arc<UnitSystem>> {
        self.system.upgrade()
    }

    pub fn same(&self, other: &SystemRef) -> bool {
        Weak::ptr_eq(&self.system, &other.system)
    }

    pub fn is(&self, system: &UnitSystem) -> bool {
        std::ptr::eq(self.system.as_ptr(), system)
    }
}

impl fmt::Debug for SystemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemRef({})", self.name)
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Variant tag, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Base,
    Derived,
    Convertible,
    Combined,
    Mixed,
}

#[derive(Clone)]
pub enum Unit {
    Base(Arc<BaseUnit>),
    Derived(Arc<DerivedUnit>),
    Convertible(Arc<ConvertibleUnit>),
    Combined(Arc<CombinedUnit>),
    Mixed(Arc<MixedUnit>),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Base(_) => UnitKind::Base,
            Unit::Derived(_) => UnitKind::Derived,
            Unit::Convertible(_) => UnitKind::Convertible,
            Unit::Combined(_) => UnitKind::Combined,
            Unit::Mixed(_) => UnitKind::Mixed,
        }
    }

    /// The owning system. Convertible units belong to their primary's system,
    /// mixed units to their main unit's, combined units to their first term's.
    pub fn system_ref(&self) -> Option<SystemRef> {
        match self {
            Unit::Base(u) => Some(u.system().clone()),
            Unit::Derived(u) => Some(u.system().clone()),
            Unit::Convertible(u) => u.primary().system_ref(),
            Unit::Combined(u) => u.some_system_ref(),
            Unit::Mixed(u) => u.main().system_ref(),
        }
    }

    pub fn system(&self) -> Option<Arc<UnitSystem>> {
        self.system_ref().and_then(|s| s.upgrade())
    }

    pub fn dimensions(&self) -> DimensionVector {
        match self {
            Unit::Base(u) => u.dimensions(),
            Unit::Derived(u) => u.dimensions(),
            Unit::Convertible(u) => u.primary().dimensions(),
            Unit::Combined(u) => u.dimensions(),
            Unit::Mixed(u) => u.main().dimensions(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Unit::Base(u) => Some(u.name()),
            Unit::Derived(u) => u.name(),
            Unit::Convertible(u) if !u.name().is_empty() => Some(u.name()),
            _ => None,
        }
    }

    /// The unit's own symbol. Anonymous, combined and mixed units have none.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Unit::Base(u) => Some(u.symbol()),
            Unit::Derived(u) => u.symbol(),
            Unit::Convertible(u) if !u.name().is_empty() => Some(u.symbol()),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        match self {
            Unit::Derived(u) => !u.is_named(),
            Unit::Convertible(u) => u.name().is_empty(),
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Symbol rendering, e.g. `km/h`, `m·kg·s^-2`.
    pub fn to_unit_string(&self) -> String {
        self.render(false)
    }

    /// System-qualified rendering, e.g. `SI.N`, `SI.km/SI.h`.
    pub fn to_print_string(&self) -> String {
        self.render(true)
    }

    pub(crate) fn render(&self, qualified: bool) -> String {
        let qualify = |symbol: &str| match (qualified, self.system_ref()) {
            (true, Some(system)) => format!("{}.{symbol}", system.name()),
            _ => symbol.to_string(),
        };
        match self {
            Unit::Base(u) => qualify(u.symbol()),
            Unit::Derived(u) => match u.symbol() {
                Some(symbol) => qualify(symbol),
                None => render_exponents(u.dimensions(), u.system(), qualified),
            },
            Unit::Convertible(u) if u.name().is_empty() => {
                let primary = u.primary().render(qualified);
                let factor = u.to_primary(1.0);
                if primary.contains(['·', '/']) {
                    format!("{factor}·({primary})")
                } else {
                    format!("{factor}·{primary}")
                }
            }
            Unit::Convertible(u) => qualify(u.symbol()),
            Unit::Combined(u) => u.render(qualified),
            Unit::Mixed(u) => u.render(qualified),
        }
    }

    /// Render `value` in this unit. Mixed units render their segments (`1:30`);
    /// every other unit renders the number alone.
    pub fn value_string(
        &self,
        value: f64,
        format: Option<&str>,
        locale: Option<&NumberLocale>,
    ) -> String {
        match self {
            Unit::Mixed(m) => m.value_string(value, format, locale),
            _ => format_value(value, format, locale),
        }
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Structural identity: the same unit object, or an anonymous/combined unit
    /// built from identical parts. No conversion is attempted.
    pub fn same_unit(&self, other: &Unit) -> bool {
        match (self, other) {
            (Unit::Base(a), Unit::Base(b)) => Arc::ptr_eq(a, b),
            (Unit::Derived(a), Unit::Derived(b)) => {
                Arc::ptr_eq(a, b)
                    || (!a.is_named()
                        && !b.is_named()
                        && a.system().same(b.system())
                        && a.dimensions() == b.dimensions())
            }
            (Unit::Convertible(a), Unit::Convertible(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.name().is_empty()
                        && b.name().is_empty()
                        && a.primary().same_unit(b.primary())
                        && a.conversion() == b.conversion())
            }
            (Unit::Combined(a), Unit::Combined(b)) => Arc::ptr_eq(a, b) || a.same_terms(b),
            (Unit::Mixed(a), Unit::Mixed(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.main().same_unit(b.main()) && a.fractional().same_unit(b.fractional()))
            }
            _ => false,
        }
    }

    /// One of this unit.
    pub fn as_quantity(&self) -> Quantity {
        Quantity::new(1.0, self.clone())
    }

    /// The dimensionless unit of this unit's system, or the empty combination
    /// when the unit has no live system.
    pub fn dimensionless(&self) -> Unit {
        match self.system() {
            Some(system) => system.dimensionless().clone(),
            None => Unit::from(CombinedUnit::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Quantity-returning algebra
    // ------------------------------------------------------------------------

    /// `self · other`, with any prefix residue carried in the quantity's value.
    /// Fails with [`Error::UnitMath`] when an exponent leaves the i8 range.
    pub fn multiply(&self, other: &Unit) -> Result<Quantity> {
        let terms = [PrefixedUnitExponent::of(self.clone()), PrefixedUnitExponent::of(other.clone())];
        Ok(settle(CombinedUnit::product(terms)?, self.owner(other)))
    }

    pub fn divide(&self, other: &Unit) -> Result<Quantity> {
        let terms = [PrefixedUnitExponent::of(self.clone()), PrefixedUnitExponent::new(0, other.clone(), -1)];
        Ok(settle(CombinedUnit::product(terms)?, self.owner(other)))
    }

    pub fn pow(&self, n: i8) -> Result<Quantity> {
        if n == 1 {
            return Ok(self.as_quantity());
        }
        Ok(settle(CombinedUnit::product([PrefixedUnitExponent::new(0, self.clone(), n)])?, self))
    }

    /// `n`-th root. Tries to divide every term's exponent first; failing that,
    /// resolves the unit in its own system and takes the root of its dimensions.
    pub fn root(&self, n: i8) -> Result<Quantity> {
        if n <= 0 {
            return Err(Error::UnitMath(format!("cannot take root {n} of {self}")));
        }
        if n == 1 {
            return Ok(self.as_quantity());
        }
        if let Some(combined) = CombinedUnit::from_unit(self).root_terms(n) {
            return Ok(settle((1.0, combined), self));
        }
        let not_representable =
            || Error::UnitMath(format!("root {n} of {self} is not representable"));
        let system = self.system().ok_or_else(not_representable)?;
        let resolved = Converter::detached()
            .to_system(&self.as_quantity(), &system)
            .ok_or_else(not_representable)?;
        let dims = resolved.unit().dimensions().root(n).ok_or_else(not_representable)?;
        Ok(Quantity::new(nth_root(resolved.value(), n), system.unit_from_dimensions(dims)))
    }

    /// `10^prefix_exponent · self`.
    pub fn prefixed(&self, prefix_exponent: i8) -> Result<Quantity> {
        if prefix_exponent == 0 {
            return Ok(self.as_quantity());
        }
        let term = PrefixedUnitExponent::new(prefix_exponent, self.clone(), 1);
        Ok(settle(CombinedUnit::product([term])?, self))
    }

    /// The operand whose system names the result of a product.
    fn owner<'a>(&'a self, other: &'a Unit) -> &'a Unit {
        if self.system_ref().is_some() { self } else { other }
    }

    // ------------------------------------------------------------------------
    // Unit-returning combinators
    // ------------------------------------------------------------------------

    pub fn combine_multiply(&self, other: &Unit) -> Result<Unit> {
        self.multiply(other)?.into_unit()
    }

    pub fn combine_divide(&self, other: &Unit) -> Result<Unit> {
        self.divide(other)?.into_unit()
    }

    pub fn combine_pow(&self, n: i8) -> Result<Unit> {
        self.pow(n)?.into_unit()
    }

    pub fn combine_root(&self, n: i8) -> Result<Unit> {
        self.root(n)?.into_unit()
    }

    pub fn combine_prefix(&self, prefix_exponent: i8) -> Result<Unit> {
        self.prefixed(prefix_exponent)?.into_unit()
    }

    // ------------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------------

    /// How much of `to` one of this unit is, or `None` if there is no conversion.
    pub fn convert_to(&self, to: &Unit, catalog: &UnitCatalog) -> Option<Quantity> {
        Converter::new(catalog).convert(&self.as_quantity(), to)
    }

    /// One of this unit expressed in `system`'s normalized unit.
    pub fn convert_to_system(&self, system: &UnitSystem, catalog: &UnitCatalog) -> Option<Quantity> {
        Converter::new(catalog).to_system(&self.as_quantity(), system)
    }

    /// One of this unit expressed in its own system's normalized unit
    /// (a base unit, a named derived unit, or an anonymous derived unit).
    pub fn to_system_unit(&self, catalog: &UnitCatalog) -> Option<Quantity> {
        let system = self.system()?;
        self.convert_to_system(&system, catalog)
    }

    /// One of this unit expressed purely in its system's base units, never
    /// through a named derived unit.
    pub fn convert_to_base_unit(&self, catalog: &UnitCatalog) -> Option<Quantity> {
        let system = self.system()?;
        let q = self.convert_to_system(&system, catalog)?;
        Some(Quantity::new(q.value(), system.base_unit_for(q.unit().dimensions())))
    }

    /// Unit equality.
    ///
    /// Units of different systems are equal when one of the first is exactly one
    /// of the second. Base and derived units of one system compare by dimensions.
    /// Everything else compares through the system's normalized unit, so Celsius
    /// and kelvin differ even though their dimensions agree.
    pub fn equivalent(&self, other: &Unit, catalog: &UnitCatalog) -> bool {
        if self.same_unit(other) {
            return true;
        }
        if let (Some(a), Some(b)) = (self.system_ref(), other.system_ref()) {
            if !a.same(&b) {
                return other
                    .convert_to(self, catalog)
                    .is_some_and(|q| values_equal(q.value(), 1.0));
            }
        }
        let plain = |u: &Unit| matches!(u, Unit::Base(_) | Unit::Derived(_));
        if plain(self) && plain(other) {
            return self.dimensions() == other.dimensions();
        }
        match (self.to_system_unit(catalog), other.to_system_unit(catalog)) {
            (Some(a), Some(b)) => {
                a.unit().dimensions() == b.unit().dimensions()
                    && values_equal(a.value(), b.value())
            }
            _ => false,
        }
    }
}

/// Collapse a lone unprefixed term back to its unit. A fully cancelled
/// product is the dimensionless unit of `owner`'s system.
fn settle((factor, combined): (f64, CombinedUnit), owner: &Unit) -> Quantity {
    if combined.is_empty() {
        return Quantity::new(factor, owner.dimensionless());
    }
    Quantity::new(factor, combined.into_unit())
}

/// `m·kg·s^-2` style rendering of an exponent vector through the base units
/// of `system`.
fn render_exponents(dims: DimensionVector, system: &SystemRef, qualified: bool) -> String {
    let live = system.upgrade();
    dims.nonzero()
        .map(|(i, e)| {
            let base = live
                .as_ref()
                .and_then(|s| s.base_units().get(i).cloned())
                .map(|u| u.render(qualified))
                .unwrap_or_else(|| crate::dimension::Measure::ALL[i].symbol().to_string());
            if e == 1 { base } else { format!("{base}^{e}") }
        })
        .collect::<Vec<_>>()
        .join("·")
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unit_string())
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unit").field(&self.kind()).field(&self.to_print_string()).finish()
    }
}

/// Equality against the standard catalog. Use [`Unit::equivalent`] for others.
impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other, UnitCatalog::standard())
    }
}

impl From<Arc<BaseUnit>> for Unit {
    fn from(u: Arc<BaseUnit>) -> Self {
        Unit::Base(u)
    }
}

impl From<Arc<DerivedUnit>> for Unit {
    fn from(u: Arc<DerivedUnit>) -> Self {
        Unit::Derived(u)
    }
}

impl From<ConvertibleUnit> for Unit {
    fn from(u: ConvertibleUnit) -> Self {
        Unit::Convertible(Arc::new(u))
    }
}

impl From<MixedUnit> for Unit {
    fn from(u: MixedUnit) -> Self {
        Unit::Mixed(Arc::new(u))
    }
}
