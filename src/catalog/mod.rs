//! The unit catalog: registered systems, the conversion graph between them,
//! and the lookup context used by the parser.
//!
//! ## Conversion graph
//!
//! Systems are nodes, [`UnitSystemConversion`]s are edges. A conversion between
//! two systems is found by
//!
//! 1. a registered edge joining them (either direction),
//! 2. a previously synthesized edge from the cache,
//! 3. a search growing two frontiers, one from each system, one edge at a time
//!    over the edges not yet consumed, until they share a system. The path is
//!    folded into a single synthesized edge with [`UnitSystemConversion::chain`]
//!    and cached.
//!
//! Every search step consumes an edge, so the search ends after at most as many
//! steps as there are edges.

pub mod convert;
pub mod standard;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::quantity::Quantity;
use crate::system::{UnitSystem, UnitSystemConversion};
use crate::unit::{CombinedUnit, Unit};
use crate::{Error, Result};

use convert::Converter;

// ============================================================================
// UnitCatalog
// ============================================================================

/// A conversion edge together with the direction to apply it in.
#[derive(Debug, Clone)]
pub struct SystemConversionRef {
    pub conversion: Arc<UnitSystemConversion>,
    pub backwards: bool,
}

impl SystemConversionRef {
    pub fn convert_quantity(&self, quantity: &Quantity) -> Option<Quantity> {
        self.conversion.convert_quantity(quantity, self.backwards)
    }
}

pub struct UnitCatalog {
    systems: Vec<Arc<UnitSystem>>,
    by_name: HashMap<String, usize>,
    conversions: Vec<Arc<UnitSystemConversion>>,
    synthesized: RwLock<Vec<Arc<UnitSystemConversion>>>,
}

impl UnitCatalog {
    pub fn builder() -> UnitCatalogBuilder {
        UnitCatalogBuilder::default()
    }

    /// The process-wide catalog of SI, CGS, MGD and MGM.
    pub fn standard() -> &'static UnitCatalog {
        standard::catalog()
    }

    pub fn systems(&self) -> &[Arc<UnitSystem>] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&Arc<UnitSystem>> {
        self.by_name.get(name).map(|&i| &self.systems[i])
    }

    /// Registered edges, not including synthesized ones.
    pub fn conversions(&self) -> &[Arc<UnitSystemConversion>] {
        &self.conversions
    }

    pub fn synthesized_count(&self) -> usize {
        self.synthesized.read().len()
    }

    pub fn conversion_between(&self, from: &UnitSystem, to: &UnitSystem) -> Option<SystemConversionRef> {
        if std::ptr::eq(from, to) {
            return None;
        }
        if let Some(found) = find_edge(&self.conversions, from, to) {
            return Some(found);
        }
        if let Some(found) = find_edge(&self.synthesized.read(), from, to) {
            debug!(from = from.name(), to = to.name(), "reusing synthesized system conversion");
            return Some(found);
        }

        let path = search(from, to, self.conversions.clone())?;
        let hops = path.len();
        let synthesized = fold_path(&path)?;
        let conversion = {
            let mut cache = self.synthesized.write();
            // another caller may have synthesized the same edge meanwhile
            if let Some(found) = find_edge(&cache, from, to) {
                return Some(found);
            }
            let conversion = Arc::new(synthesized);
            cache.push(conversion.clone());
            conversion
        };
        debug!(from = from.name(), to = to.name(), hops, "synthesized system conversion");
        Some(SystemConversionRef { conversion, backwards: false })
    }

    pub fn convert(&self, quantity: &Quantity, to: &Unit) -> Option<Quantity> {
        Converter::new(self).convert(quantity, to)
    }

    pub fn convert_to_system(&self, quantity: &Quantity, system: &UnitSystem) -> Option<Quantity> {
        Converter::new(self).to_system(quantity, system)
    }
}

impl std::fmt::Debug for UnitCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitCatalog")
            .field("systems", &self.systems.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("conversions", &self.conversions.len())
            .field("synthesized", &self.synthesized_count())
            .finish()
    }
}

fn find_edge(
    edges: &[Arc<UnitSystemConversion>],
    from: &UnitSystem,
    to: &UnitSystem,
) -> Option<SystemConversionRef> {
    edges.iter().find_map(|c| {
        c.connects(from, to)
            .map(|backwards| SystemConversionRef { conversion: c.clone(), backwards })
    })
}

// ============================================================================
// Graph search
// ============================================================================

type Hop = (Arc<UnitSystemConversion>, bool);

/// Systems reached from one end, each with the hops leading to it.
struct Frontier {
    reached: Vec<(Arc<UnitSystem>, Vec<Hop>)>,
}

impl Frontier {
    fn new(origin: Arc<UnitSystem>) -> Self {
        Self { reached: vec![(origin, Vec::new())] }
    }

    fn path_to(&self, system: &UnitSystem) -> Option<&Vec<Hop>> {
        self.reached.iter().find(|(s, _)| std::ptr::eq(&**s, system)).map(|(_, p)| p)
    }

    /// Consume the first remaining edge leaving the frontier. Edges with both
    /// ends already reached are consumed without growing it.
    fn grow(&mut self, remaining: &mut Vec<Arc<UnitSystemConversion>>) -> Option<Arc<UnitSystem>> {
        while let Some(i) = remaining
            .iter()
            .position(|e| self.reached.iter().any(|(s, _)| e.touches(s)))
        {
            let edge = remaining.remove(i);
            let (known, backwards) = match self.path_to(edge.base()) {
                Some(_) => (edge.base().clone(), false),
                None => (edge.converted().clone(), true),
            };
            let next = edge.target(backwards).clone();
            if self.path_to(&next).is_some() {
                continue;
            }
            let mut path = self.path_to(&known).cloned().unwrap_or_default();
            path.push((edge, backwards));
            self.reached.push((next.clone(), path));
            return Some(next);
        }
        None
    }
}

fn system_arc(edges: &[Arc<UnitSystemConversion>], system: &UnitSystem) -> Option<Arc<UnitSystem>> {
    edges.iter().find_map(|e| {
        if std::ptr::eq(&**e.base(), system) {
            Some(e.base().clone())
        } else if std::ptr::eq(&**e.converted(), system) {
            Some(e.converted().clone())
        } else {
            None
        }
    })
}

/// Hops from `from` to `to`, or `None` if the systems are not connected.
fn search(from: &UnitSystem, to: &UnitSystem, mut remaining: Vec<Arc<UnitSystemConversion>>) -> Option<Vec<Hop>> {
    let mut near = Frontier::new(system_arc(&remaining, from)?);
    let mut far = Frontier::new(system_arc(&remaining, to)?);
    loop {
        let mut grew = false;
        if let Some(reached) = near.grow(&mut remaining) {
            grew = true;
            if let Some(back) = far.path_to(&reached) {
                return Some(join(near.path_to(&reached)?, back));
            }
        }
        if let Some(reached) = far.grow(&mut remaining) {
            grew = true;
            if let Some(forth) = near.path_to(&reached) {
                return Some(join(forth, far.path_to(&reached)?));
            }
        }
        if !grew {
            return None;
        }
    }
}

/// `forth` leads from the start to the meeting system, `back` from the end to
/// it; the result walks start to end.
fn join(forth: &[Hop], back: &[Hop]) -> Vec<Hop> {
    forth
        .iter()
        .cloned()
        .chain(back.iter().rev().map(|(edge, backwards)| (edge.clone(), !backwards)))
        .collect()
}

/// One edge from the path's start to its end. `None` only for an empty path
/// or hops that do not meet.
fn fold_path(path: &[Hop]) -> Option<UnitSystemConversion> {
    let ((first, first_backwards), rest) = path.split_first()?;
    let mut acc = first.oriented(*first_backwards);
    for (edge, backwards) in rest {
        acc = UnitSystemConversion::chain(&acc, false, edge, *backwards)?;
    }
    Some(acc)
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Default)]
pub struct UnitCatalogBuilder {
    systems: Vec<Arc<UnitSystem>>,
    conversions: Vec<UnitSystemConversion>,
}

impl UnitCatalogBuilder {
    pub fn system(mut self, system: Arc<UnitSystem>) -> Self {
        self.systems.push(system);
        self
    }

    pub fn conversion(mut self, conversion: UnitSystemConversion) -> Self {
        self.conversions.push(conversion);
        self
    }

    /// Panics on duplicate system names or edges to unregistered systems.
    pub fn build(self) -> UnitCatalog {
        self.try_build().unwrap_or_else(|e| panic!("invalid unit catalog: {e}"))
    }

    pub fn try_build(self) -> Result<UnitCatalog> {
        let mut by_name = HashMap::with_capacity(self.systems.len());
        for (i, system) in self.systems.iter().enumerate() {
            if by_name.insert(system.name().to_string(), i).is_some() {
                return Err(Error::Definition(format!("unit system '{}' registered twice", system.name())));
            }
        }
        let registered = |s: &Arc<UnitSystem>| self.systems.iter().any(|r| Arc::ptr_eq(r, s));
        for c in &self.conversions {
            if !registered(c.base()) || !registered(c.converted()) {
                return Err(Error::Definition(format!(
                    "conversion {} -> {} references an unregistered system",
                    c.base().name(),
                    c.converted().name()
                )));
            }
            if Arc::ptr_eq(c.base(), c.converted()) {
                return Err(Error::Definition(format!("conversion from {} to itself", c.base().name())));
            }
        }
        Ok(UnitCatalog {
            by_name,
            systems: self.systems,
            conversions: self.conversions.into_iter().map(Arc::new).collect(),
            synthesized: RwLock::new(Vec::new()),
        })
    }
}

// ============================================================================
// UnitContext
// ============================================================================

/// Symbol lookup context: a catalog plus a stack of default systems.
///
/// Lookup tries the default systems innermost first, then every catalog
/// system in registration order. The stack is owned by the context, not by
/// the process, so separate contexts never see each other's defaults.
#[derive(Debug, Clone)]
pub struct UnitContext<'c> {
    catalog: &'c UnitCatalog,
    defaults: Vec<Arc<UnitSystem>>,
}

impl<'c> UnitContext<'c> {
    pub fn new(catalog: &'c UnitCatalog) -> Self {
        Self { catalog, defaults: Vec::new() }
    }

    /// The standard catalog with SI as default system.
    pub fn standard() -> UnitContext<'static> {
        let catalog = UnitCatalog::standard();
        UnitContext { catalog, defaults: catalog.system("SI").cloned().into_iter().collect() }
    }

    pub fn catalog(&self) -> &'c UnitCatalog {
        self.catalog
    }

    pub fn default_system(&self) -> Option<&Arc<UnitSystem>> {
        self.defaults.last()
    }

    /// Make `system` the innermost default until the returned scope drops.
    pub fn push_default_system(&mut self, system: Arc<UnitSystem>) -> DefaultSystemScope<'_, 'c> {
        self.defaults.push(system);
        DefaultSystemScope { context: self }
    }

    /// Systems in lookup order, each once.
    pub fn systems(&self) -> impl Iterator<Item = &Arc<UnitSystem>> {
        let defaults = self.defaults.iter().rev();
        let rest = self
            .catalog
            .systems()
            .iter()
            .filter(|s| !self.defaults.iter().any(|d| Arc::ptr_eq(d, s)));
        let mut seen: Vec<*const UnitSystem> = Vec::new();
        defaults.chain(rest).filter(move |s| {
            let p = Arc::as_ptr(*s);
            if seen.contains(&p) {
                false
            } else {
                seen.push(p);
                true
            }
        })
    }

    pub fn unit_from_symbol(&self, symbol: &str) -> Option<Unit> {
        self.systems().find_map(|s| s.unit_from_symbol(symbol))
    }

    pub fn scaled_unit_from_symbol(&self, symbol: &str) -> Option<Unit> {
        self.systems().find_map(|s| s.scaled_unit_from_symbol(symbol))
    }

    pub fn unit_from_name(&self, name: &str) -> Option<Unit> {
        self.systems().find_map(|s| s.unit_from_name(name))
    }

    /// Default system's dimensionless unit.
    pub fn dimensionless(&self) -> Unit {
        match self.systems().next() {
            Some(system) => system.dimensionless().clone(),
            None => Unit::from(CombinedUnit::new()),
        }
    }
}

/// Pops its default system when dropped.
pub struct DefaultSystemScope<'a, 'c> {
    context: &'a mut UnitContext<'c>,
}

impl<'c> Deref for DefaultSystemScope<'_, 'c> {
    type Target = UnitContext<'c>;

    fn deref(&self) -> &UnitContext<'c> {
        self.context
    }
}

impl<'c> DerefMut for DefaultSystemScope<'_, 'c> {
    fn deref_mut(&mut self) -> &mut UnitContext<'c> {
        self.context
    }
}

impl Drop for DefaultSystemScope<'_, '_> {
    fn drop(&mut self) {
        self.context.defaults.pop();
    }
}
