//! The standard catalog: SI, CGS and the two small demonstration systems MGD
//! (metre, gram, day) and MGM (metre, gram, minute).
//!
//! Edges: SI ↔ CGS, SI ↔ MGD, MGD ↔ MGM. Everything else is synthesized on
//! first use.

use std::sync::{Arc, LazyLock};

use crate::dimension::DimensionVector;
use crate::system::{UnitSystem, UnitSystemConversion};
use crate::value_conversion::ValueConversion;

use super::UnitCatalog;

static STANDARD: LazyLock<UnitCatalog> = LazyLock::new(build);

pub(super) fn catalog() -> &'static UnitCatalog {
    &STANDARD
}

pub fn si() -> Arc<UnitSystem> {
    UnitSystem::builder("SI")
        .base_unit("metre", "m")
        .base_unit("kilogram", "kg")
        .base_unit("second", "s")
        .base_unit("ampere", "A")
        .base_unit("kelvin", "K")
        .base_unit("mole", "mol")
        .base_unit("candela", "cd")
        //                                    L   M   T   I  Θ  N  J
        .named_derived_unit("hertz", "Hz", &[0, 0, -1])
        .named_derived_unit("newton", "N", &[1, 1, -2])
        .named_derived_unit("pascal", "Pa", &[-1, 1, -2])
        .named_derived_unit("joule", "J", &[2, 1, -2])
        .named_derived_unit("watt", "W", &[2, 1, -3])
        .named_derived_unit("coulomb", "C", &[0, 0, 1, 1])
        .named_derived_unit("volt", "V", &[2, 1, -3, -1])
        .named_derived_unit("farad", "F", &[-2, -1, 4, 2])
        .named_derived_unit("ohm", "Ω", &[2, 1, -3, -2])
        .named_derived_unit("siemens", "S", &[-2, -1, 3, 2])
        .named_derived_unit("weber", "Wb", &[2, 1, -2, -1])
        .named_derived_unit("tesla", "T", &[0, 1, -2, -1])
        .named_derived_unit("henry", "H", &[2, 1, -2, -2])
        .named_derived_unit("gray", "Gy", &[2, 0, -2])
        .named_derived_unit("katal", "kat", &[0, 0, -1, 0, 0, 1])
        .named_derived_unit("lux", "lx", &[-2, 0, 0, 0, 0, 0, 1])
        .convertible_unit("gram", "g", "kg", ValueConversion::scaled(1000.0))
        .convertible_unit("tonne", "t", "kg", ValueConversion::scaled(0.001))
        .convertible_unit("degree Celsius", "°C", "K", ValueConversion::linear(-273.15, 1.0))
        .convertible_unit("degree Fahrenheit", "°F", "K", ValueConversion::linear(-459.67, 1.8))
        .convertible_unit("minute", "min", "s", ValueConversion::scaled(1.0 / 60.0))
        .convertible_unit("hour", "h", "s", ValueConversion::scaled(1.0 / 3600.0))
        .convertible_unit("day", "d", "s", ValueConversion::scaled(1.0 / 86400.0))
        .convertible_unit("litre", "l", DimensionVector::from_slice(&[3]), ValueConversion::scaled(1000.0))
        .convertible_unit("hectare", "ha", DimensionVector::from_slice(&[2]), ValueConversion::scaled(1e-4))
        .convertible_unit("bar", "bar", "Pa", ValueConversion::scaled(1e-5))
        .build()
}

pub fn cgs() -> Arc<UnitSystem> {
    UnitSystem::builder("CGS")
        .base_unit("centimetre", "cm")
        .base_unit("gram", "g")
        .base_unit("second", "s")
        .base_unit("biot", "Bi")
        .base_unit("kelvin", "K")
        .base_unit("mole", "mol")
        .base_unit("candela", "cd")
        .named_derived_unit("dyne", "dyn", &[1, 1, -2])
        .named_derived_unit("erg", "erg", &[2, 1, -2])
        .named_derived_unit("barye", "Ba", &[-1, 1, -2])
        .named_derived_unit("gal", "Gal", &[1, 0, -2])
        .named_derived_unit("poise", "P", &[-1, 1, -1])
        .named_derived_unit("stokes", "St", &[2, 0, -1])
        .build()
}

pub fn mgd() -> Arc<UnitSystem> {
    UnitSystem::builder("MGD")
        .base_unit("metre", "m")
        .base_unit("gram", "g")
        .base_unit("day", "d")
        .build()
}

pub fn mgm() -> Arc<UnitSystem> {
    UnitSystem::builder("MGM")
        .base_unit("metre", "m")
        .base_unit("gram", "g")
        .base_unit("minute", "min")
        .build()
}

fn scaled(scale: f64) -> Option<ValueConversion> {
    Some(ValueConversion::scaled(scale))
}

const IDENTITY: Option<ValueConversion> = Some(ValueConversion::Identity);

fn build() -> UnitCatalog {
    let (si, cgs, mgd, mgm) = (si(), cgs(), mgd(), mgm());
    UnitCatalog::builder()
        .system(si.clone())
        .system(cgs.clone())
        .system(mgd.clone())
        .system(mgm.clone())
        .conversion(UnitSystemConversion::new(
            si.clone(),
            cgs,
            [scaled(100.0), scaled(1000.0), IDENTITY, scaled(0.1), IDENTITY, IDENTITY, IDENTITY],
        ))
        .conversion(UnitSystemConversion::new(
            si,
            mgd.clone(),
            [IDENTITY, scaled(1000.0), scaled(1.0 / 86400.0), None, None, None, None],
        ))
        .conversion(UnitSystemConversion::new(
            mgd,
            mgm,
            [IDENTITY, IDENTITY, scaled(1440.0), None, None, None, None],
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_contents() {
        let c = UnitCatalog::standard();
        let names: Vec<_> = c.systems().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["SI", "CGS", "MGD", "MGM"]);
        let si = c.system("SI").unwrap();
        assert_eq!(si.base_units().len(), 7);
        assert_eq!(si.named_derived_units().len(), 16);
        assert_eq!(si.convertible_units().len(), 10);
        assert_eq!(c.conversions().len(), 3);
    }

    #[test]
    fn test_symbols_unique_within_si() {
        let si = UnitCatalog::standard().system("SI").unwrap();
        let symbols: Vec<_> = si.units().filter_map(|u| u.symbol()).collect();
        for (i, s) in symbols.iter().enumerate() {
            assert!(!symbols[i + 1..].contains(s), "duplicate symbol {s}");
        }
    }

    #[test]
    fn test_every_si_unit_resolves_by_name() {
        let si = UnitCatalog::standard().system("SI").unwrap();
        for u in si.units() {
            let by_name = si.unit_from_name(u.name().unwrap()).unwrap();
            assert!(by_name.same_unit(u), "{u:?}");
        }
    }
}
