//! End-to-end tests for the unit-expression parser.
//!
//! Tests symbol resolution, operator precedence, implicit multiplication,
//! system-qualified symbols, mixed units and error positions.
//! Each test exercises: text -> tokens -> postfix -> unit, against the standard catalog.

use physical_measure::parser::{parse_quantity, parse_unit, try_parse_quantity, try_parse_unit};
use physical_measure::{Error, Quantity, Unit, UnitCatalog, UnitContext, UnitKind};
use pretty_assertions::assert_eq;

fn unit(text: &str) -> Unit {
    parse_unit(text, &UnitContext::standard()).unwrap()
}

fn format_error<T: std::fmt::Debug>(result: physical_measure::Result<T>) -> (usize, String, String) {
    match result {
        Err(Error::Format { position, fragment, message }) => (position, fragment, message),
        other => panic!("expected a format error, got {other:?}"),
    }
}

// ============================================================================
// 1. Named units resolve to their system
// ============================================================================

#[test]
fn test_newton_is_si_derived() {
    let n = unit("N");
    assert_eq!(n.kind(), UnitKind::Derived);
    assert_eq!(n.to_print_string(), "SI.N");
    assert_eq!(n.dimensions().exponents(), &[1, 1, -2, 0, 0, 0, 0]);
}

#[test]
fn test_cgs_only_symbols_fall_through_to_cgs() {
    assert_eq!(unit("dyn").to_print_string(), "CGS.dyn");
    assert_eq!(unit("Gal").to_print_string(), "CGS.Gal");
    // SI is the default system, so a shared symbol stays SI
    assert_eq!(unit("s").to_print_string(), "SI.s");
}

// ============================================================================
// 2. Operators, precedence and implicit multiplication
// ============================================================================

#[test]
fn test_explicit_and_implicit_products_agree() {
    let explicit = unit("kg*m/s^2");
    let implicit = unit("kg m s^-2");
    let dotted = unit("kg·m/s^2");
    assert_eq!(explicit, implicit);
    assert_eq!(explicit, dotted);
    assert_eq!(explicit, unit("N"));
}

#[test]
fn test_power_binds_tighter_than_division() {
    assert_eq!(unit("m/s^2").to_unit_string(), "m/s^2");
    assert_eq!(unit("(m/s)^2").to_unit_string(), "m^2/s^2");
    assert_eq!(unit("m/s/s").to_unit_string(), "m/s^2");
}

#[test]
fn test_whitespace_is_ignored() {
    assert_eq!(unit("  kg · m / s ^ 2  ").to_unit_string(), "kg·m/s^2");
}

#[test]
fn test_dimensionless_one() {
    let per_second = unit("1/s");
    assert_eq!(per_second.to_unit_string(), "s^-1");
    assert_eq!(per_second, unit("Hz"));
}

#[test]
fn test_cancelled_expression_is_the_system_one() {
    let one = unit("1");
    for text in ["m/m", "kg·s/(kg·s)", "km/km"] {
        let cancelled = unit(text);
        assert!(cancelled.same_unit(&one), "{text} -> {cancelled:?}");
        assert!(cancelled.dimensions().is_dimensionless());
        assert_eq!(cancelled.system().map(|s| s.name().to_string()), Some("SI".to_string()));
        assert!(unit(&cancelled.to_print_string()).same_unit(&one));
    }
    assert_eq!(unit("cm/s^2·s^2/cm").to_print_string(), one.to_print_string());
}

// ============================================================================
// 3. Prefixes
// ============================================================================

#[test]
fn test_prefixed_symbols() {
    let km = unit("km");
    assert_eq!(km.kind(), UnitKind::Combined);
    assert_eq!(km.to_unit_string(), "km");
    assert_eq!(unit("μs").to_unit_string(), "μs");
    assert_eq!(unit("kmol").to_unit_string(), "kmol");
}

#[test]
fn test_exact_symbol_beats_prefix_split() {
    // candela, not centi-day
    assert_eq!(unit("cd").to_print_string(), "SI.cd");
    assert_eq!(unit("min").to_print_string(), "SI.min");
    assert_eq!(unit("Pa").to_print_string(), "SI.Pa");
}

// ============================================================================
// 4. System-qualified round trip
// ============================================================================

#[test]
fn test_every_si_unit_round_trips() {
    let ctx = UnitContext::standard();
    let si = UnitCatalog::standard().system("SI").unwrap();
    for u in si.units() {
        let printed = u.to_print_string();
        let parsed = parse_unit(&printed, &ctx).unwrap_or_else(|e| panic!("{printed}: {e}"));
        assert!(parsed.same_unit(u), "{printed} parsed to {parsed:?}");

        let plain = u.to_unit_string();
        assert!(parse_unit(&plain, &ctx).unwrap().same_unit(u), "{plain}");
    }
}

#[test]
fn test_qualified_combined_round_trip() {
    let speed = unit("km/h");
    let printed = speed.to_print_string();
    assert_eq!(printed, "SI.km/SI.h");
    assert!(unit(&printed).same_unit(&speed));
}

#[test]
fn test_qualifier_selects_system() {
    let cgs_s = unit("CGS.s");
    let si_s = unit("SI.s");
    assert!(!cgs_s.same_unit(&si_s));
    // still equal: one CGS second is one SI second
    assert_eq!(cgs_s, si_s);
}

// ============================================================================
// 5. Mixed units
// ============================================================================

#[test]
fn test_mixed_unit_chain() {
    let hms = unit("h:min:s");
    assert_eq!(hms.kind(), UnitKind::Mixed);
    assert_eq!(hms.to_unit_string(), "h:min:s");

    let q = parse_quantity("1:30:15 h:min:s", &UnitContext::standard()).unwrap();
    assert!((q.value() - 1.504_166_666_666_666_7).abs() < 1e-12);
    assert_eq!(q.value_string(None, None), "1:30:15");
}

#[test]
fn test_mixed_unit_requires_convertible_segments() {
    let (position, fragment, _) = format_error(parse_unit("h:kg", &UnitContext::standard()));
    assert_eq!((position, fragment.as_str()), (2, "kg"));
}

// ============================================================================
// 6. Errors carry 0-based character positions
// ============================================================================

#[test]
fn test_unknown_symbol_position() {
    let (position, fragment, message) = format_error(parse_unit("kg·m/qq", &UnitContext::standard()));
    assert_eq!(position, 5);
    assert_eq!(fragment, "qq");
    assert_eq!(message, "unknown unit symbol");
}

#[test]
fn test_position_counts_characters_not_bytes() {
    // '°' and '·' are multi-byte
    let (position, ..) = format_error(parse_unit("°C·qq", &UnitContext::standard()));
    assert_eq!(position, 3);
}

#[test]
fn test_structural_errors() {
    let ctx = UnitContext::standard();
    assert_eq!(format_error(parse_unit("(m/s", &ctx)).0, 0);
    assert_eq!(format_error(parse_unit("m/s)", &ctx)).0, 3);
    assert_eq!(format_error(parse_unit("m^", &ctx)).0, 2);
    assert_eq!(format_error(parse_unit("m*/s", &ctx)).0, 1);
    assert_eq!(format_error(parse_unit("   ", &ctx)).0, 0);
}

#[test]
fn test_error_display_names_the_fragment() {
    let err = parse_unit("m/xyz", &UnitContext::standard()).unwrap_err();
    assert_eq!(err.to_string(), "Unit format error at position 2 near 'xyz': unknown unit symbol");
}

#[test]
fn test_exponent_past_i8_is_math_error() {
    let ctx = UnitContext::standard();
    assert!(matches!(parse_unit("m^-128", &ctx), Err(Error::UnitMath(_))));
    assert!(matches!(parse_unit("m^100·m^100", &ctx), Err(Error::UnitMath(_))));
    assert!(matches!(parse_unit("(m^100)^2", &ctx), Err(Error::UnitMath(_))));

    let big = unit("m^100");
    assert!(matches!(big.combine_multiply(&big), Err(Error::UnitMath(_))));
    assert_eq!(unit("m^-127").dimensions().exponents()[0], -127);
    assert_eq!(unit("m^100/m^100").to_print_string(), unit("1").to_print_string());
}

// ============================================================================
// 7. Partial parsing
// ============================================================================

#[test]
fn test_try_parse_unit_keeps_valid_prefix() {
    let ctx = UnitContext::standard();
    let partial = try_parse_unit("m/s #3", &ctx).unwrap();
    assert_eq!(partial.unit.to_unit_string(), "m/s");
    assert_eq!(partial.remainder, "#3");

    let full = try_parse_unit("N", &ctx).unwrap();
    assert_eq!(full.remainder, "");
}

#[test]
fn test_try_parse_quantity_keeps_valid_prefix() {
    let ctx = UnitContext::standard();
    let partial = try_parse_quantity("3.5 kg, 2 m", &ctx).unwrap();
    assert_eq!(partial.quantity.value(), 3.5);
    assert_eq!(partial.quantity.unit().to_unit_string(), "kg");
    assert_eq!(partial.remainder, ", 2 m");
}

// ============================================================================
// 8. Quantities through FromStr
// ============================================================================

#[test]
fn test_quantity_from_str() {
    let q: Quantity = "9.81 m/s^2".parse().unwrap();
    assert_eq!(q.value(), 9.81);
    assert_eq!(q.to_string(), "9.81 m/s^2");
    assert_eq!(q.to_print_string(), "9.81 SI.m/SI.s^2");

    let again: Quantity = q.to_print_string().parse().unwrap();
    assert_eq!(again, q);
}

#[test]
fn test_quantity_errors_offset_past_the_number() {
    let err = "12.5 m/qq".parse::<Quantity>().unwrap_err();
    let Error::Format { position, fragment, .. } = err else { panic!("expected a format error") };
    assert_eq!((position, fragment.as_str()), (7, "qq"));
}
