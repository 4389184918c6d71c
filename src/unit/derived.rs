//! Derived units: an explicit dimension vector within one system, optionally named.

use crate::dimension::DimensionVector;

use super::SystemRef;

/// Name and symbol of a named derived unit (newton, watt, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNaming {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug)]
pub struct DerivedUnit {
    system: SystemRef,
    exponents: DimensionVector,
    naming: Option<UnitNaming>,
}

impl DerivedUnit {
    pub(crate) fn anonymous(system: SystemRef, exponents: DimensionVector) -> Self {
        Self { system, exponents, naming: None }
    }

    pub(crate) fn named(
        system: SystemRef,
        exponents: DimensionVector,
        name: String,
        symbol: String,
    ) -> Self {
        Self { system, exponents, naming: Some(UnitNaming { name, symbol }) }
    }

    pub fn system(&self) -> &SystemRef {
        &self.system
    }

    pub fn dimensions(&self) -> DimensionVector {
        self.exponents
    }

    pub fn is_named(&self) -> bool {
        self.naming.is_some()
    }

    pub fn naming(&self) -> Option<&UnitNaming> {
        self.naming.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.naming.as_ref().map(|n| n.name.as_str())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.naming.as_ref().map(|n| n.symbol.as_str())
    }
}
