//! Combined units: un-normalized products and quotients of prefixed unit powers.
//!
//! A combined unit keeps its factors symbolically (`kg·m/s^2`) and may mix units
//! of several systems. Resolution to a concrete unit happens only on conversion.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::dimension::DimensionVector;
use crate::prefix::UnitPrefixTable;
use crate::quantity::Quantity;
use crate::{Error, Result};

use super::{SystemRef, Unit};

type Terms = SmallVec<[PrefixedUnitExponent; 4]>;

/// `(10^prefix_exponent · unit)^exponent`.
///
/// Inside a [`CombinedUnit`] term lists the exponent is always positive; the
/// list (numerators or denominators) carries the sign. As a multiplication
/// operand the exponent is signed.
#[derive(Debug, Clone)]
pub struct PrefixedUnitExponent {
    pub prefix_exponent: i8,
    pub unit: Unit,
    pub exponent: i8,
}

impl PrefixedUnitExponent {
    pub fn new(prefix_exponent: i8, unit: Unit, exponent: i8) -> Self {
        Self { prefix_exponent, unit, exponent }
    }

    pub fn of(unit: Unit) -> Self {
        Self::new(0, unit, 1)
    }

    /// Fold an outer `(prefix, exponent)` pair into this term.
    ///
    /// The exponents multiply. The outer prefix contributes `10^(prefix·exponent)`,
    /// which is absorbed into this term's prefix when it divides evenly by the new
    /// exponent and lands on a prefix step; otherwise it is returned as a residual
    /// scale factor and the prefix is left unchanged.
    pub fn combine(&self, outer_prefix: i8, outer_exponent: i8) -> Result<(PrefixedUnitExponent, f64)> {
        let exponent = self.exponent.checked_mul(outer_exponent).ok_or_else(|| {
            exponent_overflow(format!("raising {} to {outer_exponent}", self.render(self.exponent, false)))
        })?;
        let outer10 = i32::from(outer_prefix) * i32::from(outer_exponent);
        let keep = |p| PrefixedUnitExponent::new(p, self.unit.clone(), exponent);

        if outer10 == 0 {
            return Ok((keep(self.prefix_exponent), 1.0));
        }
        if exponent != 0 && outer10 % i32::from(exponent) == 0 {
            let folded = i32::from(self.prefix_exponent) + outer10 / i32::from(exponent);
            if let Ok(p) = i8::try_from(folded) {
                if UnitPrefixTable::si().is_prefix_exponent(p) {
                    return Ok((keep(p), 1.0));
                }
            }
        }
        Ok((keep(self.prefix_exponent), 10f64.powi(outer10)))
    }

    /// The unit's dimensions raised to the exponent; `None` past the i8 range.
    pub fn dimensions(&self) -> Option<DimensionVector> {
        self.unit.dimensions().pow(self.exponent)
    }

    fn matches(&self, prefix_exponent: i8, unit: &Unit) -> bool {
        self.prefix_exponent == prefix_exponent && self.unit.same_unit(unit)
    }

    fn same_term(&self, other: &PrefixedUnitExponent) -> bool {
        self.exponent == other.exponent && self.matches(other.prefix_exponent, &other.unit)
    }

    fn render(&self, exponent: i8, qualified: bool) -> String {
        let prefix = match UnitPrefixTable::si().symbol_of(self.prefix_exponent) {
            Some(c) => c.to_string(),
            None if self.prefix_exponent == 0 => String::new(),
            None => format!("10^{}·", self.prefix_exponent),
        };
        let mut s = match (self.unit.symbol(), self.unit.system_ref()) {
            (Some(symbol), Some(system)) if qualified && !self.unit.is_anonymous() => {
                format!("{}.{prefix}{symbol}", system.name())
            }
            (Some(symbol), _) => format!("{prefix}{symbol}"),
            (None, _) => {
                let inner = self.unit.render(qualified);
                if inner.contains(['·', '/', '^']) {
                    format!("{prefix}({inner})")
                } else {
                    format!("{prefix}{inner}")
                }
            }
        };
        if exponent != 1 {
            s.push_str(&format!("^{exponent}"));
        }
        s
    }
}

fn exponent_overflow(what: impl fmt::Display) -> Error {
    Error::UnitMath(format!("exponent out of range: {what}"))
}

/// A base or derived unit with no dimensions: multiplying by it changes nothing.
fn is_unit_one(prefix_exponent: i8, unit: &Unit) -> bool {
    prefix_exponent == 0
        && matches!(unit, Unit::Base(_) | Unit::Derived(_))
        && unit.dimensions().is_dimensionless()
}

/// A symbolic product/quotient of prefixed unit powers.
///
/// Every term exponent and the summed dimensions stay inside the i8 range;
/// operations that would leave it fail with [`Error::UnitMath`].
#[derive(Debug, Clone, Default)]
pub struct CombinedUnit {
    numerators: Terms,
    denominators: Terms,
    dimensions: DimensionVector,
}

impl CombinedUnit {
    /// The empty (dimensionless) combination.
    pub fn new() -> Self {
        Self::default()
    }

    /// View any unit as a combination. Combined units are copied, mixed units
    /// contribute their main unit, a dimensionless unit is the empty
    /// combination and everything else becomes a single term.
    pub fn from_unit(unit: &Unit) -> Self {
        match unit {
            Unit::Combined(c) => (**c).clone(),
            Unit::Mixed(m) => Self::from_unit(m.main()),
            other if is_unit_one(0, other) => Self::new(),
            other => {
                let mut c = Self::new();
                c.numerators.push(PrefixedUnitExponent::of(other.clone()));
                c.dimensions = other.dimensions();
                c
            }
        }
    }

    /// The product of `terms`, with the scale factor picked up on the way.
    pub(crate) fn product<I>(terms: I) -> Result<(f64, CombinedUnit)>
    where
        I: IntoIterator<Item = PrefixedUnitExponent>,
    {
        let mut result = CombinedUnit::new();
        let mut factor = 1.0;
        for term in terms {
            factor *= result.multiply_in(term)?;
        }
        result.refresh()?;
        Ok((factor, result))
    }

    pub fn numerators(&self) -> &[PrefixedUnitExponent] {
        &self.numerators
    }

    pub fn denominators(&self) -> &[PrefixedUnitExponent] {
        &self.denominators
    }

    pub fn is_empty(&self) -> bool {
        self.numerators.is_empty() && self.denominators.is_empty()
    }

    pub fn dimensions(&self) -> DimensionVector {
        self.dimensions
    }

    fn checked_dimensions(&self) -> Option<DimensionVector> {
        let up = self
            .numerators
            .iter()
            .try_fold(DimensionVector::DIMENSIONLESS, |acc, t| acc.checked_add(&t.dimensions()?))?;
        self.denominators.iter().try_fold(up, |acc, t| acc.checked_sub(&t.dimensions()?))
    }

    fn refresh(&mut self) -> Result<()> {
        match self.checked_dimensions() {
            Some(dims) => {
                self.dimensions = dims;
                Ok(())
            }
            None => Err(exponent_overflow(format!("dimensions of {self}"))),
        }
    }

    /// The system of the first term that has one. A combination of terms from
    /// several systems has no single owner; the first one found stands in.
    pub fn some_system_ref(&self) -> Option<SystemRef> {
        self.numerators
            .iter()
            .chain(self.denominators.iter())
            .find_map(|t| t.unit.system_ref())
    }

    /// Multiply by one prefixed unit power, returning the scale factor picked
    /// up on the way together with the resulting combination.
    pub fn multiply_term(&self, term: &PrefixedUnitExponent) -> Result<Quantity> {
        let mut result = self.clone();
        let factor = result.multiply_in(term.clone())?;
        result.refresh()?;
        Ok(Quantity::new(factor, Unit::Combined(Arc::new(result))))
    }

    pub fn multiply_unit(&self, unit: &Unit) -> Result<Quantity> {
        self.multiply_term(&PrefixedUnitExponent::of(unit.clone()))
    }

    pub fn divide_unit(&self, unit: &Unit) -> Result<Quantity> {
        self.multiply_term(&PrefixedUnitExponent::new(0, unit.clone(), -1))
    }

    /// Leaves `dimensions` stale; callers `refresh` once done.
    fn multiply_in(&mut self, term: PrefixedUnitExponent) -> Result<f64> {
        let PrefixedUnitExponent { mut prefix_exponent, unit, exponent } = term;
        let unit = match unit {
            Unit::Mixed(m) => m.main().clone(),
            u => u,
        };
        if exponent == 0 || is_unit_one(prefix_exponent, &unit) {
            return Ok(1.0);
        }
        // anonymous scaled units have no symbol; their factor moves out
        if let Unit::Convertible(c) = &unit {
            if c.name().is_empty() && !c.conversion().has_offset() {
                let scale = c.to_primary(1.0).powi(i32::from(exponent));
                let primary = PrefixedUnitExponent::new(prefix_exponent, c.primary().clone(), exponent);
                return Ok(scale * self.multiply_in(primary)?);
            }
        }

        let mut factor = 1.0;
        if !UnitPrefixTable::si().is_prefix_exponent(prefix_exponent) {
            factor *= 10f64.powi(i32::from(prefix_exponent) * i32::from(exponent));
            prefix_exponent = 0;
        }

        if let Some(i) = self.numerators.iter().position(|t| t.matches(prefix_exponent, &unit)) {
            let e = i32::from(self.numerators[i].exponent) + i32::from(exponent);
            let t = self.numerators.remove(i);
            self.reinsert(t, e)?;
            return Ok(factor);
        }
        if let Some(i) = self.denominators.iter().position(|t| t.matches(prefix_exponent, &unit)) {
            let e = i32::from(self.denominators[i].exponent) - i32::from(exponent);
            let t = self.denominators.remove(i);
            self.reinsert(t, -e)?;
            return Ok(factor);
        }

        if let Unit::Combined(inner) = &unit {
            let mut pending = prefix_exponent;
            let terms = inner
                .numerators
                .iter()
                .cloned()
                .chain(inner.denominators.iter().map(|t| {
                    PrefixedUnitExponent::new(t.prefix_exponent, t.unit.clone(), -t.exponent)
                }));
            for t in terms {
                let (folded, residual) = t.combine(pending, exponent)?;
                pending = 0;
                factor *= residual;
                factor *= self.multiply_in(folded)?;
            }
            if pending != 0 {
                factor *= 10f64.powi(i32::from(pending) * i32::from(exponent));
            }
            return Ok(factor);
        }

        self.reinsert(PrefixedUnitExponent::new(prefix_exponent, unit, exponent), i32::from(exponent))?;
        Ok(factor)
    }

    /// Put `term` back with signed exponent `e`, routing it to the list its
    /// sign selects. Magnitudes past `i8::MAX` are out of range.
    fn reinsert(&mut self, mut term: PrefixedUnitExponent, e: i32) -> Result<()> {
        if e == 0 {
            return Ok(());
        }
        term.exponent = i8::try_from(e.abs()).map_err(|_| {
            exponent_overflow(format!("{}^{e}", term.render(1, false)))
        })?;
        if e > 0 {
            self.numerators.push(term);
        } else {
            self.denominators.push(term);
        }
        Ok(())
    }

    /// Distribute an integer power over every term.
    pub fn pow(&self, n: i8) -> Result<CombinedUnit> {
        let mut result = CombinedUnit::new();
        for t in &self.numerators {
            result.reinsert(t.clone(), i32::from(t.exponent) * i32::from(n))?;
        }
        for t in &self.denominators {
            result.reinsert(t.clone(), -i32::from(t.exponent) * i32::from(n))?;
        }
        result.refresh()?;
        Ok(result)
    }

    /// Divide every term's exponent by `n`; `None` unless all divide evenly.
    pub fn root_terms(&self, n: i8) -> Option<CombinedUnit> {
        if n <= 0 {
            return None;
        }
        let divide = |terms: &Terms| -> Option<Terms> {
            terms
                .iter()
                .map(|t| {
                    (t.exponent % n == 0).then(|| {
                        PrefixedUnitExponent::new(t.prefix_exponent, t.unit.clone(), t.exponent / n)
                    })
                })
                .collect()
        };
        Some(CombinedUnit {
            numerators: divide(&self.numerators)?,
            denominators: divide(&self.denominators)?,
            dimensions: self.dimensions.root(n)?,
        })
    }

    /// Apply a prefix to the whole combination.
    pub fn with_prefix(&self, prefix_exponent: i8) -> Result<Quantity> {
        let (factor, result) = CombinedUnit::product([PrefixedUnitExponent::new(
            prefix_exponent,
            Unit::Combined(Arc::new(self.clone())),
            1,
        )])?;
        Ok(Quantity::new(factor, Unit::Combined(Arc::new(result))))
    }

    /// Term-by-term identity, independent of term order.
    pub fn same_terms(&self, other: &CombinedUnit) -> bool {
        fn same_list(a: &Terms, b: &Terms) -> bool {
            a.len() == b.len() && a.iter().all(|t| b.iter().any(|u| t.same_term(u)))
        }
        same_list(&self.numerators, &other.numerators)
            && same_list(&self.denominators, &other.denominators)
    }

    /// Collapse a lone unprefixed first-power term back to its unit.
    pub fn into_unit(self) -> Unit {
        if self.denominators.is_empty() && self.numerators.len() == 1 {
            let t = &self.numerators[0];
            if t.prefix_exponent == 0 && t.exponent == 1 {
                return t.unit.clone();
            }
        }
        Unit::Combined(Arc::new(self))
    }

    pub(crate) fn render(&self, qualified: bool) -> String {
        if self.numerators.is_empty() {
            return self
                .denominators
                .iter()
                .map(|t| t.render(-t.exponent, qualified))
                .collect::<Vec<_>>()
                .join("·");
        }
        let mut s = self
            .numerators
            .iter()
            .map(|t| t.render(t.exponent, qualified))
            .collect::<Vec<_>>()
            .join("·");
        match self.denominators.len() {
            0 => {}
            1 => {
                s.push('/');
                s.push_str(&self.denominators[0].render(self.denominators[0].exponent, qualified));
            }
            _ => {
                let den = self
                    .denominators
                    .iter()
                    .map(|t| t.render(t.exponent, qualified))
                    .collect::<Vec<_>>()
                    .join("·");
                s.push_str(&format!("/({den})"));
            }
        }
        s
    }
}

impl fmt::Display for CombinedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

impl From<CombinedUnit> for Unit {
    fn from(c: CombinedUnit) -> Self {
        Unit::Combined(Arc::new(c))
    }
}
