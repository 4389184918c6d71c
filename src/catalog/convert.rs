//! Cross-kind conversion dispatch.
//!
//! `convert` decides, from the kinds of the source and target units, which
//! rule moves a quantity from one to the other:
//!
//! | from \ to        | rule                                                    |
//! |------------------|---------------------------------------------------------|
//! | same unit        | identity                                                |
//! | mixed            | continue from the main unit                             |
//! | any → mixed      | convert to the main unit, relabel                       |
//! | any → combined   | normalize both in one system, require equal dimensions  |
//! | combined → any   | normalize in the target's system, then continue         |
//! | convertible      | continue from the primary unit                          |
//! | any → convertible| convert to the primary unit, apply its transform        |
//! | base/derived     | same system: equal dimensions; else a system conversion |
//!
//! A missing conversion is `None`, never an error.

use tracing::warn;

use crate::quantity::Quantity;
use crate::system::UnitSystem;
use crate::unit::{CombinedUnit, PrefixedUnitExponent, Unit};

use super::UnitCatalog;

/// Nesting bound for the dispatch. Real unit graphs stay far below it.
const MAX_DEPTH: usize = 32;

#[derive(Clone, Copy)]
pub(crate) struct Converter<'a> {
    catalog: Option<&'a UnitCatalog>,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(catalog: &'a UnitCatalog) -> Self {
        Self { catalog: Some(catalog) }
    }

    /// Conversions inside one system only.
    pub(crate) fn detached() -> Converter<'static> {
        Converter { catalog: None }
    }

    pub(crate) fn convert(&self, quantity: &Quantity, to: &Unit) -> Option<Quantity> {
        self.convert_at(quantity, to, 0)
    }

    /// Express `quantity` in `system`'s normalized unit.
    pub(crate) fn to_system(&self, quantity: &Quantity, system: &UnitSystem) -> Option<Quantity> {
        self.to_system_at(quantity, system, 0)
    }

    fn guard(depth: usize, from: &Unit, to: &dyn std::fmt::Display) -> bool {
        if depth > MAX_DEPTH {
            warn!(from = %from, to = %to, depth, "unit conversion nested too deeply");
            return false;
        }
        true
    }

    fn convert_at(&self, quantity: &Quantity, to: &Unit, depth: usize) -> Option<Quantity> {
        let from = quantity.unit();
        if !Self::guard(depth, from, to) {
            return None;
        }
        let depth = depth + 1;
        let value = quantity.value();

        if from.same_unit(to) {
            return Some(Quantity::new(value, to.clone()));
        }
        if let Unit::Mixed(m) = from {
            return self.convert_at(&Quantity::new(value, m.main().clone()), to, depth);
        }
        if let Unit::Mixed(m) = to {
            let q = self.convert_at(quantity, m.main(), depth)?;
            return Some(Quantity::new(q.value(), to.clone()));
        }

        if let Unit::Combined(_) = to {
            let system = to.system().or_else(|| from.system())?;
            let source = self.to_system_at(quantity, &system, depth)?;
            let target = self.to_system_at(&to.as_quantity(), &system, depth)?;
            if source.unit().dimensions() != target.unit().dimensions() {
                return None;
            }
            return Some(Quantity::new(source.value() / target.value(), to.clone()));
        }
        if let Unit::Combined(_) = from {
            let system = to.system()?;
            let normalized = self.to_system_at(quantity, &system, depth)?;
            return self.convert_at(&normalized, to, depth);
        }

        if let Unit::Convertible(c) = from {
            let primary = Quantity::new(c.to_primary(value), c.primary().clone());
            return self.convert_at(&primary, to, depth);
        }
        if let Unit::Convertible(c) = to {
            let q = self.convert_at(quantity, c.primary(), depth)?;
            return Some(Quantity::new(c.from_primary(q.value()), to.clone()));
        }

        // both base or derived
        let (from_sys, to_sys) = (from.system_ref()?, to.system_ref()?);
        if from_sys.same(&to_sys) {
            return (from.dimensions() == to.dimensions()).then(|| Quantity::new(value, to.clone()));
        }
        let (a, b) = (from_sys.upgrade()?, to_sys.upgrade()?);
        let edge = self.catalog?.conversion_between(&a, &b)?;
        let moved = edge.convert_quantity(quantity)?;
        (moved.unit().dimensions() == to.dimensions()).then(|| Quantity::new(moved.value(), to.clone()))
    }

    fn to_system_at(&self, quantity: &Quantity, system: &UnitSystem, depth: usize) -> Option<Quantity> {
        let unit = quantity.unit();
        if !Self::guard(depth, unit, system) {
            return None;
        }
        let depth = depth + 1;
        let value = quantity.value();

        match unit {
            Unit::Mixed(m) => self.to_system_at(&Quantity::new(value, m.main().clone()), system, depth),
            Unit::Convertible(c) => {
                let primary = Quantity::new(c.to_primary(value), c.primary().clone());
                self.to_system_at(&primary, system, depth)
            }
            Unit::Combined(c) => {
                let scale = self.combined_scale_in(c, system, depth)?;
                Some(Quantity::new(value * scale, system.unit_from_dimensions(c.dimensions())))
            }
            Unit::Base(_) | Unit::Derived(_) => {
                let own = unit.system_ref()?;
                if own.is(system) {
                    return Some(Quantity::new(value, system.unit_from_dimensions(unit.dimensions())));
                }
                let own = own.upgrade()?;
                self.catalog?.conversion_between(&own, system)?.convert_quantity(quantity)
            }
        }
    }

    /// Factor taking a value in `combined` to the normalized unit of `system`.
    fn combined_scale_in(&self, combined: &CombinedUnit, system: &UnitSystem, depth: usize) -> Option<f64> {
        let mut scale = 1.0;
        for term in combined.numerators() {
            scale *= self.term_scale_in(term, system, depth)?;
        }
        for term in combined.denominators() {
            scale /= self.term_scale_in(term, system, depth)?;
        }
        Some(scale)
    }

    /// `(10^p · s)^e` where `s` is the slope of the term's unit in `system`.
    /// Offsets play no part inside a product.
    fn term_scale_in(&self, term: &PrefixedUnitExponent, system: &UnitSystem, depth: usize) -> Option<f64> {
        let one = self.to_system_at(&term.unit.as_quantity(), system, depth)?.value();
        let zero = self.to_system_at(&Quantity::new(0.0, term.unit.clone()), system, depth)?.value();
        let slope = (one - zero) * 10f64.powi(i32::from(term.prefix_exponent));
        Some(slope.powi(i32::from(term.exponent)))
    }
}
