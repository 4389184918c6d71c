//! Base units: one per fundamental measure slot of a system.

use crate::dimension::DimensionVector;

use super::SystemRef;

/// A unit defining one fundamental dimension of its system (metre, kilogram, ...).
#[derive(Debug)]
pub struct BaseUnit {
    system: SystemRef,
    index: usize,
    name: String,
    symbol: String,
}

impl BaseUnit {
    pub(crate) fn new(system: SystemRef, index: usize, name: String, symbol: String) -> Self {
        Self { system, index, name, symbol }
    }

    pub fn system(&self) -> &SystemRef {
        &self.system
    }

    /// Slot in the system's base-unit list, which is also its measure index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimensions(&self) -> DimensionVector {
        DimensionVector::basis(self.index)
    }
}
