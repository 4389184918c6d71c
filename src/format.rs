//! Number rendering hooks for quantity values.
//!
//! Formats:
//! - none, `G`: shortest round-trip rendering (`5`, `0.1`, `1500`)
//! - `F<n>`: fixed point with n decimals
//! - `E<n>`: scientific with n decimals
//!
//! Anything else falls back to the default rendering.

use tracing::debug;

/// Locale hook. Only the decimal separator is configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLocale {
    pub decimal_separator: char,
}

impl NumberLocale {
    pub fn new(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self { decimal_separator: '.' }
    }
}

/// Largest precision accepted by `F<n>` and `E<n>`.
const MAX_PRECISION: usize = 17;

pub fn format_value(value: f64, format: Option<&str>, locale: Option<&NumberLocale>) -> String {
    let text = match format.map(str::trim) {
        None | Some("") | Some("G") | Some("g") => value.to_string(),
        Some(pattern) => apply(value, pattern).unwrap_or_else(|| {
            debug!(format = pattern, value, "unsupported number format, using default rendering");
            value.to_string()
        }),
    };
    match locale {
        Some(l) if l.decimal_separator != '.' => text.replace('.', &l.decimal_separator.to_string()),
        _ => text,
    }
}

fn apply(value: f64, pattern: &str) -> Option<String> {
    let mut chars = pattern.chars();
    let kind = chars.next()?;
    let digits = chars.as_str();
    let precision = if digits.is_empty() { 2 } else { digits.parse::<usize>().ok()? };
    if precision > MAX_PRECISION {
        return None;
    }
    match kind {
        'F' | 'f' => Some(format!("{value:.precision$}")),
        'E' | 'e' => Some(format!("{value:.precision$e}")),
        _ => None,
    }
}
