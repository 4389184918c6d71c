//! Conversions between two unit systems.
//!
//! An edge holds one value conversion per fundamental measure, mapping a value
//! in the `base` system to the `converted` system when applied forwards. A
//! missing entry means that measure has no counterpart across the edge.

use std::sync::Arc;

use crate::dimension::{DimensionVector, MEASURE_COUNT};
use crate::quantity::Quantity;
use crate::unit::Unit;
use crate::value_conversion::ValueConversion;

use super::UnitSystem;

pub struct UnitSystemConversion {
    base: Arc<UnitSystem>,
    converted: Arc<UnitSystem>,
    conversions: [Option<ValueConversion>; MEASURE_COUNT],
}

impl UnitSystemConversion {
    pub fn new(
        base: Arc<UnitSystem>,
        converted: Arc<UnitSystem>,
        conversions: [Option<ValueConversion>; MEASURE_COUNT],
    ) -> Self {
        Self { base, converted, conversions }
    }

    pub fn base(&self) -> &Arc<UnitSystem> {
        &self.base
    }

    pub fn converted(&self) -> &Arc<UnitSystem> {
        &self.converted
    }

    pub fn conversions(&self) -> &[Option<ValueConversion>; MEASURE_COUNT] {
        &self.conversions
    }

    /// `Some(backwards)` when this edge joins `from` to `to`.
    pub fn connects(&self, from: &UnitSystem, to: &UnitSystem) -> Option<bool> {
        if std::ptr::eq(&*self.base, from) && std::ptr::eq(&*self.converted, to) {
            Some(false)
        } else if std::ptr::eq(&*self.converted, from) && std::ptr::eq(&*self.base, to) {
            Some(true)
        } else {
            None
        }
    }

    pub fn touches(&self, system: &UnitSystem) -> bool {
        std::ptr::eq(&*self.base, system) || std::ptr::eq(&*self.converted, system)
    }

    pub fn source(&self, backwards: bool) -> &Arc<UnitSystem> {
        if backwards { &self.converted } else { &self.base }
    }

    pub fn target(&self, backwards: bool) -> &Arc<UnitSystem> {
        if backwards { &self.base } else { &self.converted }
    }

    /// Value factor for a quantity of dimensions `dims`: the product of each
    /// measure's slope raised to its exponent. `None` if a needed measure has
    /// no conversion.
    pub fn scale_factor(&self, dims: DimensionVector, backwards: bool) -> Option<f64> {
        dims.nonzero().try_fold(1.0, |acc, (i, e)| {
            let conversion = self.conversions[i].as_ref()?;
            Some(acc * conversion.linear_scale(backwards).powi(i32::from(e)))
        })
    }

    /// Move a base or derived unit quantity across the edge. A single
    /// first-power dimension goes through the full conversion, offset
    /// included; anything else only scales. The result is expressed in the
    /// target system's normalized unit for the same dimensions.
    pub fn convert_quantity(&self, quantity: &Quantity, backwards: bool) -> Option<Quantity> {
        debug_assert!(matches!(quantity.unit(), Unit::Base(_) | Unit::Derived(_)));
        let dims = quantity.unit().dimensions();
        let value = match dims.single_base_index() {
            Some(i) => self.conversions[i].as_ref()?.convert(quantity.value(), backwards),
            None => quantity.value() * self.scale_factor(dims, backwards)?,
        };
        Some(Quantity::new(value, self.target(backwards).unit_from_dimensions(dims)))
    }

    /// This edge as a standalone conversion from `source(backwards)` to
    /// `target(backwards)`.
    pub fn oriented(&self, backwards: bool) -> UnitSystemConversion {
        let conversions = self
            .conversions
            .clone()
            .map(|c| c.map(|c| if backwards { c.inverted() } else { c }));
        UnitSystemConversion::new(self.source(backwards).clone(), self.target(backwards).clone(), conversions)
    }

    /// Compose two edges sharing a middle system into one edge from `first`'s
    /// source to `second`'s target. `None` if the edges do not meet.
    pub fn chain(
        first: &UnitSystemConversion,
        first_backwards: bool,
        second: &UnitSystemConversion,
        second_backwards: bool,
    ) -> Option<UnitSystemConversion> {
        if !Arc::ptr_eq(first.target(first_backwards), second.source(second_backwards)) {
            return None;
        }
        let conversions = std::array::from_fn(|i| {
            match (&first.conversions[i], &second.conversions[i]) {
                (Some(ValueConversion::Identity), Some(ValueConversion::Identity)) => {
                    Some(ValueConversion::Identity)
                }
                (Some(a), Some(b)) => Some(ValueConversion::combined(
                    a.clone(),
                    first_backwards,
                    b.clone(),
                    second_backwards,
                )),
                _ => None,
            }
        });
        Some(UnitSystemConversion::new(
            first.source(first_backwards).clone(),
            second.target(second_backwards).clone(),
            conversions,
        ))
    }
}

impl std::fmt::Debug for UnitSystemConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSystemConversion")
            .field("base", &self.base.name())
            .field("converted", &self.converted.name())
            .field("conversions", &self.conversions)
            .finish()
    }
}
