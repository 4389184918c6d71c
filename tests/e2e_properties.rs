//! Property-based tests for the unit algebra.
//!
//! Covers the dimension-vector arithmetic, value-conversion inverses, the
//! pow/root inverse on units, the prefix residual factor of powered prefixed
//! units, and print/parse round trips of random unit products.

use physical_measure::parser::parse_unit;
use physical_measure::{
    DimensionVector, MEASURE_COUNT, Quantity, Unit, UnitCatalog, UnitContext, UnitPrefixTable,
    ValueConversion,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const SI_BASE_SYMBOLS: [&str; 7] = ["m", "kg", "s", "A", "K", "mol", "cd"];

fn arb_dimensions(range: std::ops::RangeInclusive<i8>) -> impl Strategy<Value = DimensionVector> {
    prop::array::uniform7(range).prop_map(DimensionVector::new)
}

fn arb_prefix_exponent() -> impl Strategy<Value = i8> {
    let exponents: Vec<i8> = UnitPrefixTable::si().iter().map(|p| p.exponent).collect();
    prop::sample::select(exponents)
}

fn arb_scale() -> impl Strategy<Value = f64> {
    prop_oneof![0.001f64..1000.0, -1000.0f64..-0.001]
}

/// `m^2·kg^-1·s^3`-style products with non-zero exponents in -3..=3.
fn arb_base_product() -> impl Strategy<Value = String> {
    prop::collection::vec((0..MEASURE_COUNT, prop_oneof![-3i8..=-1, 1i8..=3]), 1..5).prop_map(|terms| {
        terms
            .into_iter()
            .map(|(i, e)| format!("{}^{e}", SI_BASE_SYMBOLS[i]))
            .collect::<Vec<_>>()
            .join("·")
    })
}

fn si_unit(symbol: &str) -> Unit {
    parse_unit(symbol, &UnitContext::standard()).unwrap()
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}

// ============================================================================
// 1. Dimension vectors
// ============================================================================

proptest! {
    #[test]
    fn dimension_add_sub_inverse(a in arb_dimensions(-30..=30), b in arb_dimensions(-30..=30)) {
        prop_assert_eq!(a.checked_add(&b).and_then(|s| s.checked_sub(&b)), Some(a));
    }

    #[test]
    fn dimension_pow_root_inverse(v in arb_dimensions(-10..=10), n in 1i8..=5) {
        let powered = v.pow(n).unwrap();
        prop_assert_eq!(powered.root(n), Some(v));
        prop_assert_eq!(powered.dimension_count(), v.dimension_count());
    }

    #[test]
    fn dimension_root_rejects_remainders(v in arb_dimensions(-10..=10), n in 2i8..=5) {
        let divisible = v.exponents().iter().all(|e| e % n == 0);
        prop_assert_eq!(v.root(n).is_some(), divisible);
    }

    #[test]
    fn dimension_negation_cancels(v in arb_dimensions(-50..=50)) {
        let cancelled = v.checked_neg().and_then(|n| v.checked_add(&n)).unwrap();
        prop_assert!(cancelled.is_dimensionless());
    }
}

// ============================================================================
// 2. Value conversions
// ============================================================================

proptest! {
    #[test]
    fn linear_conversion_round_trips(
        value in -1e6f64..1e6,
        offset in -1000.0f64..1000.0,
        scale in arb_scale(),
    ) {
        let c = ValueConversion::linear(offset, scale);
        let back = c.convert(c.convert(value, false), true);
        prop_assert!((back - value).abs() <= 1e-12 * (value.abs() + offset.abs() / scale.abs() + 1.0));
    }

    #[test]
    fn inverted_swaps_direction(value in -1e6f64..1e6, scale in arb_scale()) {
        let c = ValueConversion::scaled(scale);
        let inv = c.clone().inverted();
        prop_assert!(close(c.convert(value, false), inv.convert(value, true), 1e-12));
    }
}

// ============================================================================
// 3. Unit algebra
// ============================================================================

proptest! {
    #[test]
    fn unit_pow_root_inverse(i in 0..MEASURE_COUNT, n in 1i8..=4) {
        let u = si_unit(SI_BASE_SYMBOLS[i]);
        let back = u.combine_pow(n).and_then(|p| p.combine_root(n)).unwrap();
        prop_assert!(back.same_unit(&u), "{:?} -> {:?}", u, back);
    }

    #[test]
    fn powered_prefix_residual(p in arb_prefix_exponent(), e in prop_oneof![-3i8..=-1, 1i8..=3]) {
        let catalog = UnitCatalog::standard();
        let m = si_unit("m");
        let prefixed = m.prefixed(p).unwrap();
        let powered = prefixed.pow(e).unwrap();
        let target = m.combine_pow(e).unwrap();
        let in_metres = powered.convert_to(&target, catalog).unwrap();
        let expected = 10f64.powi(i32::from(p) * i32::from(e));
        prop_assert!(close(in_metres.value(), expected, 1e-9), "{} vs {}", in_metres.value(), expected);
    }

    #[test]
    fn multiply_then_divide_restores(
        a in 0..MEASURE_COUNT,
        b in 0..MEASURE_COUNT,
        x in 0.001f64..1000.0,
        y in 0.001f64..1000.0,
    ) {
        let qa = Quantity::new(x, si_unit(SI_BASE_SYMBOLS[a]));
        let qb = Quantity::new(y, si_unit(SI_BASE_SYMBOLS[b]));
        let back = (qa.clone() * qb.clone()) / qb;
        prop_assert!(close(back.value(), x, 1e-12));
        prop_assert_eq!(back.unit().dimensions(), qa.unit().dimensions());
    }

    #[test]
    fn printed_units_parse_back(expr in arb_base_product()) {
        let ctx = UnitContext::standard();
        let unit = parse_unit(&expr, &ctx).unwrap();
        let printed = unit.to_print_string();
        // fully cancelled products print as the empty string
        prop_assume!(!printed.is_empty());
        let reparsed = parse_unit(&printed, &ctx).unwrap();
        prop_assert_eq!(reparsed.dimensions(), unit.dimensions());
        prop_assert!(reparsed.equivalent(&unit, UnitCatalog::standard()), "{} -> {}", expr, printed);
    }
}
