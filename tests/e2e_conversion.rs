//! End-to-end tests for unit conversion.
//!
//! Tests convertible units (scaled and offset), prefixed and combined units,
//! conversion across registered system edges, and multi-hop synthesized edges.
//! Each test exercises: parse -> convert -> compare, against a catalog.

use std::sync::Arc;

use physical_measure::catalog::standard;
use physical_measure::parser::parse_unit;
use physical_measure::{
    Quantity, Unit, UnitCatalog, UnitContext, UnitSystem, UnitSystemConversion, ValueConversion,
};
use pretty_assertions::assert_eq;

fn unit(text: &str) -> Unit {
    parse_unit(text, &UnitContext::standard()).unwrap()
}

fn q(text: &str) -> Quantity {
    text.parse().unwrap()
}

fn convert(text: &str, to: &str) -> Option<f64> {
    q(text).convert_to(&unit(to), UnitCatalog::standard()).map(|r| r.value())
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-12 * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// 1. Convertible units
// ============================================================================

#[test]
fn test_kilograms_to_grams() {
    let grams = q("5 kg").convert_to(&unit("g"), UnitCatalog::standard()).unwrap();
    assert_eq!(grams.value(), 5000.0);
    assert_eq!(grams.unit().to_unit_string(), "g");
}

#[test]
fn test_temperature_offsets() {
    assert_close(convert("0 °C", "K").unwrap(), 273.15);
    assert_close(convert("273.15 K", "°C").unwrap(), 0.0);
    assert_close(convert("100 °C", "°F").unwrap(), 212.0);
    assert_close(convert("-40 °F", "°C").unwrap(), -40.0);
}

#[test]
fn test_zero_celsius_equals_kelvin_quantity() {
    assert_eq!(q("0 °C"), q("273.15 K"));
    assert_ne!(q("0 °C"), q("0 K"));
}

#[test]
fn test_time_units() {
    assert_close(convert("1 d", "min").unwrap(), 1440.0);
    assert_close(convert("90 min", "h").unwrap(), 1.5);
}

#[test]
fn test_volume_and_area() {
    assert_close(convert("1 m^3", "l").unwrap(), 1000.0);
    assert_close(convert("1 ha", "m^2").unwrap(), 10_000.0);
    assert_close(convert("2 bar", "kPa").unwrap(), 200.0);
}

// ============================================================================
// 2. Prefixed and combined units
// ============================================================================

#[test]
fn test_kilometre() {
    let km = unit("km");
    assert_eq!(km.to_unit_string(), "km");
    assert_eq!(q("1 km"), q("1000 m"));
    assert_close(convert("1 km", "m").unwrap(), 1000.0);
    assert_close(convert("1 mm", "km").unwrap(), 1e-6);
}

#[test]
fn test_speed() {
    assert_close(convert("36 km/h", "m/s").unwrap(), 10.0);
    assert_close(convert("1 m/s", "km/h").unwrap(), 3.6);
}

#[test]
fn test_combined_to_named_derived() {
    assert_close(convert("1 kg*m/s^2", "N").unwrap(), 1.0);
    assert_close(convert("1 kJ", "N*m").unwrap(), 1000.0);
    assert_close(convert("1 W*h", "J").unwrap(), 3600.0);
}

#[test]
fn test_dimension_mismatch_is_none() {
    assert_eq!(convert("1 m", "s"), None);
    assert_eq!(convert("1 N", "J"), None);
    assert_eq!(convert("1 km/h", "m/s^2"), None);
}

#[test]
fn test_to_system_unit_normalizes() {
    let n = unit("kg*m/s^2").to_system_unit(UnitCatalog::standard()).unwrap();
    assert_eq!(n.value(), 1.0);
    assert_eq!(n.unit().to_print_string(), "SI.N");

    let base = unit("N").convert_to_base_unit(UnitCatalog::standard()).unwrap();
    assert_eq!(base.unit().to_unit_string(), "m·kg·s^-2");
}

// ============================================================================
// 3. Registered system edges
// ============================================================================

#[test]
fn test_si_cgs_round_trip() {
    let catalog = UnitCatalog::standard();
    let dyn_ = q("1 N").convert_to(&unit("dyn"), catalog).unwrap();
    assert_close(dyn_.value(), 100_000.0);
    let back = dyn_.convert_to(&unit("N"), catalog).unwrap();
    assert_close(back.value(), 1.0);

    let erg = q("1 J").convert_to(&unit("erg"), catalog).unwrap();
    assert_close(erg.value(), 1e7);
}

#[test]
fn test_convert_to_system() {
    let catalog = UnitCatalog::standard();
    let cgs = catalog.system("CGS").unwrap();
    let pressure = q("1 Pa").convert_to_system(cgs, catalog).unwrap();
    assert_close(pressure.value(), 10.0);
    assert_eq!(pressure.unit().to_print_string(), "CGS.Ba");
}

#[test]
fn test_current_has_no_mgd_counterpart() {
    let catalog = UnitCatalog::standard();
    let mgd = catalog.system("MGD").unwrap();
    assert!(q("1 A").convert_to_system(mgd, catalog).is_none());
}

// ============================================================================
// 4. Synthesized multi-hop edges
// ============================================================================

/// The standard systems in a fresh catalog, so synthesis counts are not
/// shared with other tests.
fn fresh_catalog() -> (UnitCatalog, [Arc<UnitSystem>; 4]) {
    let (si, cgs, mgd, mgm) = (standard::si(), standard::cgs(), standard::mgd(), standard::mgm());
    let s = |v: f64| Some(ValueConversion::scaled(v));
    let id = Some(ValueConversion::Identity);
    let catalog = UnitCatalog::builder()
        .system(si.clone())
        .system(cgs.clone())
        .system(mgd.clone())
        .system(mgm.clone())
        .conversion(UnitSystemConversion::new(
            si.clone(),
            cgs.clone(),
            [s(100.0), s(1000.0), id.clone(), s(0.1), id.clone(), id.clone(), id.clone()],
        ))
        .conversion(UnitSystemConversion::new(
            si.clone(),
            mgd.clone(),
            [id.clone(), s(1000.0), s(1.0 / 86400.0), None, None, None, None],
        ))
        .conversion(UnitSystemConversion::new(
            mgd.clone(),
            mgm.clone(),
            [id.clone(), id, s(1440.0), None, None, None, None],
        ))
        .build();
    (catalog, [si, cgs, mgd, mgm])
}

#[test]
fn test_cgs_to_mgd_matches_manual_route() {
    let (catalog, [si, cgs, mgd, _]) = fresh_catalog();
    let source = Quantity::new(3.0, cgs.scaled_unit_from_symbol("g").unwrap())
        .divide(&Quantity::new(1.0, cgs.scaled_unit_from_symbol("s").unwrap()))
        .unwrap();

    let direct = source.convert_to_system(&mgd, &catalog).unwrap();
    assert_eq!(catalog.synthesized_count(), 1);

    let via_si = source
        .convert_to_system(&si, &catalog)
        .and_then(|q| q.convert_to_system(&mgd, &catalog))
        .unwrap();
    assert_close(direct.value(), via_si.value());
    // 3 g/s = 3 · 86400 g/d
    assert_close(direct.value(), 259_200.0);
    assert_eq!(direct.unit().to_print_string(), "MGD.g·MGD.d^-1");
}

#[test]
fn test_synthesized_edge_is_cached_and_reversible() {
    let (catalog, [_, cgs, _, mgm]) = fresh_catalog();
    let cm = cgs.unit_from_symbol("cm").unwrap();
    let m = mgm.unit_from_symbol("m").unwrap();

    assert_close(cm.convert_to(&m, &catalog).unwrap().value(), 0.01);
    assert_eq!(catalog.synthesized_count(), 1);

    assert_close(m.convert_to(&cm, &catalog).unwrap().value(), 100.0);
    assert_eq!(catalog.synthesized_count(), 1);
}

#[test]
fn test_three_hop_time() {
    let (catalog, [_, cgs, _, mgm]) = fresh_catalog();
    let s = cgs.unit_from_symbol("s").unwrap();
    let min = mgm.unit_from_symbol("min").unwrap();
    assert_close(Quantity::new(120.0, s).convert_to(&min, &catalog).unwrap().value(), 2.0);
}

#[test]
fn test_standard_catalog_synthesizes_on_demand() {
    let minutes = q("90 CGS.s").convert_to(&unit("MGM.min"), UnitCatalog::standard()).unwrap();
    assert_close(minutes.value(), 1.5);
    assert!(UnitCatalog::standard().synthesized_count() >= 1);
}
