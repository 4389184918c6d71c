//! Mixed units: display chains such as `h:min` or `h:min:s`.
//!
//! A mixed unit has no algebra of its own. Values are held in the main unit
//! (`1:30 h:min` is 1.5 h); the fractional units only affect rendering and
//! parsing of the `:`-separated segments.

use std::fmt;

use crate::catalog::UnitCatalog;
use crate::format::{NumberLocale, format_value};

use super::Unit;

const SEPARATOR: char = ':';

/// Decimal places kept in the last rendered segment.
const LAST_SEGMENT_DECIMALS: i32 = 9;

#[derive(Debug)]
pub struct MixedUnit {
    main: Unit,
    fractional: Unit,
    fractional_per_main: f64,
}

impl MixedUnit {
    /// Chain `main` with `fractional`. `None` unless one `main` converts into a
    /// positive finite amount of the fractional unit.
    pub fn new(main: Unit, fractional: Unit, catalog: &UnitCatalog) -> Option<Self> {
        let target = match &fractional {
            Unit::Mixed(m) => m.main.clone(),
            u => u.clone(),
        };
        let factor = main.convert_to(&target, catalog)?.value();
        if !(factor.is_finite() && factor > 0.0) {
            return None;
        }
        Some(Self { main, fractional, fractional_per_main: factor })
    }

    pub fn main(&self) -> &Unit {
        &self.main
    }

    pub fn fractional(&self) -> &Unit {
        &self.fractional
    }

    /// How many fractional units make one main unit (60 for `h:min`).
    pub fn fractional_per_main(&self) -> f64 {
        self.fractional_per_main
    }

    /// Each link of the chain with the factor to the next link.
    fn links(&self) -> Vec<(&Unit, f64)> {
        let mut links = vec![(&self.main, self.fractional_per_main)];
        let mut next = &self.fractional;
        loop {
            match next {
                Unit::Mixed(m) => {
                    links.push((&m.main, m.fractional_per_main));
                    next = &m.fractional;
                }
                u => {
                    links.push((u, 1.0));
                    return links;
                }
            }
        }
    }

    /// Split a main-unit value into per-link segments, e.g. 1.5 → [1, 30].
    pub fn segments(&self, value: f64) -> Vec<f64> {
        let links = self.links();
        let mut segments = Vec::with_capacity(links.len());
        let mut rest = value.abs();
        for (i, (_, factor)) in links.iter().enumerate() {
            if i + 1 == links.len() {
                let scale = 10f64.powi(LAST_SEGMENT_DECIMALS);
                segments.push((rest * scale).round() / scale);
            } else {
                let whole = rest.trunc();
                segments.push(whole);
                rest = (rest - whole) * factor;
            }
        }
        // rounding the tail can produce 60 minutes; carry it upwards
        for i in (1..segments.len()).rev() {
            let limit = links[i - 1].1;
            if segments[i] >= limit {
                segments[i] -= limit;
                segments[i - 1] += 1.0;
            }
        }
        segments
    }

    /// Inverse of [`segments`](Self::segments). `None` when more segments are
    /// given than the chain has links. The sign of the first segment applies
    /// to the whole value.
    pub fn combine_segments(&self, segments: &[f64]) -> Option<f64> {
        let links = self.links();
        if segments.is_empty() || segments.len() > links.len() {
            return None;
        }
        let mut total = 0.0;
        let mut divisor = 1.0;
        for (i, segment) in segments.iter().enumerate() {
            total += segment.abs() / divisor;
            divisor *= links[i].1;
        }
        Some(if segments[0].is_sign_negative() { -total } else { total })
    }

    /// `1:30` for 1.5 in `h:min`. Every segment after the first is padded to
    /// two integer digits. A custom format applies to the last segment only.
    pub fn value_string(
        &self,
        value: f64,
        format: Option<&str>,
        locale: Option<&NumberLocale>,
    ) -> String {
        let segments = self.segments(value);
        let last = segments.len() - 1;
        let mut out = String::new();
        if value < 0.0 {
            out.push('-');
        }
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            let text = if i == last {
                format_value(*segment, format, locale)
            } else {
                format!("{}", *segment as i64)
            };
            if i > 0 && *segment < 10.0 {
                out.push('0');
            }
            out.push_str(&text);
        }
        out
    }

    pub(crate) fn render(&self, qualified: bool) -> String {
        format!("{}{SEPARATOR}{}", self.main.render(qualified), self.fractional.render(qualified))
    }
}

impl fmt::Display for MixedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn si(symbol: &str) -> Unit {
        UnitCatalog::standard().system("SI").unwrap().unit_from_symbol(symbol).unwrap()
    }

    fn hours_minutes() -> MixedUnit {
        MixedUnit::new(si("h"), si("min"), UnitCatalog::standard()).unwrap()
    }

    #[test]
    fn test_factor() {
        assert_eq!(hours_minutes().fractional_per_main(), 60.0);
        assert_eq!(hours_minutes().to_string(), "h:min");
    }

    #[test]
    fn test_value_string() {
        let hm = hours_minutes();
        assert_eq!(hm.value_string(1.5, None, None), "1:30");
        assert_eq!(hm.value_string(2.0, None, None), "2:00");
        assert_eq!(hm.value_string(0.1, None, None), "0:06");
        assert_eq!(hm.value_string(-1.25, None, None), "-1:15");
    }

    #[test]
    fn test_rounding_carries() {
        let hm = hours_minutes();
        assert_eq!(hm.value_string(1.0 + 59.9999999999 / 60.0, None, None), "2:00");
    }

    #[test]
    fn test_three_links() {
        let ms = MixedUnit::new(si("min"), si("s"), UnitCatalog::standard()).unwrap();
        let hms = MixedUnit::new(si("h"), Unit::from(ms), UnitCatalog::standard()).unwrap();
        assert_eq!(hms.to_string(), "h:min:s");
        assert_eq!(hms.value_string(1.5125, None, None), "1:30:45");
        let v = hms.combine_segments(&[1.0, 30.0, 45.0]).unwrap();
        assert!((v - 1.5125).abs() < 1e-12);
        assert_eq!(hms.combine_segments(&[1.0, 2.0, 3.0, 4.0]), None);
    }

    #[test]
    fn test_incompatible_links_rejected() {
        assert!(MixedUnit::new(si("h"), si("m"), UnitCatalog::standard()).is_none());
    }
}
