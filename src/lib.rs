//! # physical-measure-rs: Units, Systems and Quantities
//!
//! A dimension-checked unit algebra. Units belong to unit systems, systems are
//! linked by per-dimension conversion edges, and quantities carry a value in a
//! unit.
//!
//! ## Design Principles
//!
//! 1. **Closed unit model**: [`Unit`] is an enum over five kinds (base, derived,
//!    convertible, combined, mixed); no trait objects
//! 2. **Deferred algebra**: combining units builds a [`CombinedUnit`] and only
//!    resolves it against a system when a conversion asks for it
//! 3. **Explicit catalog**: conversions take a [`UnitCatalog`]; the process-wide
//!    [`UnitCatalog::standard()`] backs the std traits (`FromStr`, `PartialEq`)
//! 4. **Conversions are fallible, not exceptional**: `convert_*` returns `Option`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use physical_measure::{Quantity, UnitCatalog, UnitContext, parser};
//!
//! # fn example() -> physical_measure::Result<()> {
//! let ctx = UnitContext::standard();
//! let g = parser::parse_unit("g", &ctx)?;
//!
//! let mass: Quantity = "5 kg".parse()?;
//! let grams = mass.convert_to(&g, UnitCatalog::standard());
//! assert_eq!(grams.map(|q| q.value()), Some(5000.0));
//!
//! let accel: Quantity = "9.81 m/s^2".parse()?;
//! println!("{}", accel.to_print_string()); // 9.81 SI.m/SI.s^2
//! # Ok(())
//! # }
//! ```
//!
//! ## Standard Systems
//!
//! | System | Base units | Linked to |
//! |--------|------------|-----------|
//! | SI | m, kg, s, A, K, mol, cd | CGS, MGD |
//! | CGS | cm, g, s, Bi, K, mol, cd | SI |
//! | MGD | m, g, d | SI, MGM |
//! | MGM | m, g, min | MGD |

// ============================================================================
// Modules
// ============================================================================

pub mod catalog;
pub mod dimension;
pub mod format;
pub mod parser;
pub mod prefix;
pub mod quantity;
pub mod system;
pub mod unit;
pub mod value_conversion;

// ============================================================================
// Re-exports: Units
// ============================================================================

pub use dimension::{DimensionVector, MEASURE_COUNT, Measure};
pub use prefix::{UnitPrefix, UnitPrefixTable};
pub use unit::{
    BaseUnit, CombinedUnit, ConvertibleUnit, DerivedUnit, MixedUnit,
    PrefixedUnitExponent, SystemRef, Unit, UnitKind,
};
pub use value_conversion::ValueConversion;

// ============================================================================
// Re-exports: Systems and catalog
// ============================================================================

pub use catalog::{DefaultSystemScope, SystemConversionRef, UnitCatalog, UnitCatalogBuilder, UnitContext};
pub use system::{PrimaryUnit, UnitSystem, UnitSystemBuilder, UnitSystemConversion, UnitSystemDef};

// ============================================================================
// Re-exports: Quantities
// ============================================================================

pub use format::NumberLocale;
pub use quantity::{Quantity, REL_TOLERANCE, values_equal};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unit format error at position {position} near '{fragment}': {message}")]
    Format { position: usize, fragment: String, message: String },

    #[error("Unit math error: {0}")]
    UnitMath(String),

    #[error("Cannot convert {from} to {to}")]
    NotConvertible { from: String, to: String },

    #[error("Unit system definition error: {0}")]
    Definition(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
