//! # Unit Expressions
//!
//! Turns strings such as `kg·m/s^2`, `SI.km/SI.h` or `h:min` into units, and
//! `9.81 m/s^2` or `1:30 h:min` into quantities.
//!
//! Every function comes in two flavours: `parse_*` fails with
//! [`Error::Format`] (0-based character position plus the offending
//! fragment), `try_parse_*` returns the longest valid prefix and the text it
//! could not consume.

pub mod expr;
pub mod lexer;

pub use lexer::{Span, Token, TokenKind, Tokenized, tokenize};

use crate::catalog::UnitContext;
use crate::quantity::Quantity;
use crate::unit::{MixedUnit, Unit};
use crate::{Error, Result};

const SEGMENT_SEPARATOR: char = ':';

/// A unit parsed from the start of a string.
#[derive(Debug, Clone)]
pub struct PartialUnit<'a> {
    pub unit: Unit,
    pub remainder: &'a str,
}

/// A quantity parsed from the start of a string.
#[derive(Debug, Clone)]
pub struct PartialQuantity<'a> {
    pub quantity: Quantity,
    pub remainder: &'a str,
}

/// Parse a unit expression. `:` separated segments build a mixed unit
/// (`h:min:s`), each segment converting into the one before it.
pub fn parse_unit(text: &str, ctx: &UnitContext<'_>) -> Result<Unit> {
    parse_unit_at(text, 0, ctx)
}

/// Parse as much of `text` as forms a valid unit.
pub fn try_parse_unit<'a>(text: &'a str, ctx: &UnitContext<'_>) -> Option<PartialUnit<'a>> {
    if let Ok(unit) = parse_unit(text, ctx) {
        return Some(PartialUnit { unit, remainder: "" });
    }
    let Tokenized { tokens, .. } = tokenize(text, ctx);
    (1..=tokens.len()).rev().find_map(|len| {
        let unit = expr::evaluate(&tokens[..len]).ok()?;
        let end = byte_index(text, tokens[len - 1].span.end);
        Some(PartialUnit { unit, remainder: text[end..].trim_start() })
    })
}

/// Parse `<number> [unit]`. A missing unit means dimensionless. The number
/// may be split into `:` segments (`1:30 h:min`) when the unit is mixed.
pub fn parse_quantity(text: &str, ctx: &UnitContext<'_>) -> Result<Quantity> {
    let number = scan_number(text).ok_or_else(|| Error::Format {
        position: text.chars().take_while(|c| c.is_whitespace()).count(),
        fragment: text.trim().to_string(),
        message: "expected a number".to_string(),
    })?;

    let rest = &text[number.end..];
    let trimmed = rest.trim_start();
    let unit_start = text[..text.len() - trimmed.len()].chars().count();
    let unit = if trimmed.trim_end().is_empty() {
        ctx.dimensionless()
    } else {
        parse_unit_at(trimmed.trim_end(), unit_start, ctx)?
    };
    let value = number.value(&unit).ok_or_else(|| Error::Format {
        position: number.second_segment,
        fragment: text[..number.end].trim().to_string(),
        message: format!("segmented value needs a mixed unit with enough segments, got '{unit}'"),
    })?;
    Ok(Quantity::new(value, unit))
}

/// Parse a number and as much of the following unit as is valid. A number
/// followed by nothing usable yields a dimensionless quantity.
pub fn try_parse_quantity<'a>(text: &'a str, ctx: &UnitContext<'_>) -> Option<PartialQuantity<'a>> {
    if let Ok(quantity) = parse_quantity(text, ctx) {
        return Some(PartialQuantity { quantity, remainder: "" });
    }
    let number = scan_number(text)?;
    let rest = text[number.end..].trim_start();

    if let Some(PartialUnit { unit, remainder }) = try_parse_unit(rest, ctx) {
        if let Some(value) = number.value(&unit) {
            return Some(PartialQuantity { quantity: Quantity::new(value, unit), remainder });
        }
    }
    let dimensionless = ctx.dimensionless();
    let value = number.value(&dimensionless)?;
    Some(PartialQuantity { quantity: Quantity::new(value, dimensionless), remainder: rest })
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_unit_at(text: &str, offset: usize, ctx: &UnitContext<'_>) -> Result<Unit> {
    let mut segments: Vec<(usize, &str)> = Vec::new();
    let (mut start_char, mut start_byte) = (0, 0);
    for (char_pos, (byte_pos, c)) in text.char_indices().enumerate() {
        if c == SEGMENT_SEPARATOR {
            segments.push((start_char, &text[start_byte..byte_pos]));
            start_char = char_pos + 1;
            start_byte = byte_pos + c.len_utf8();
        }
    }
    segments.push((start_char, &text[start_byte..]));

    let units = segments
        .iter()
        .map(|&(pos, segment)| parse_expression(segment, offset + pos, ctx))
        .collect::<Result<Vec<_>>>()?;

    // h:min:s is h:(min:s)
    let mut units = units.into_iter().enumerate().rev();
    let Some((_, mut unit)) = units.next() else {
        return Err(Error::Format { position: offset, fragment: String::new(), message: "empty unit".into() });
    };
    for (i, main) in units {
        let (pos, fragment) = segments[i + 1];
        let mixed = MixedUnit::new(main.clone(), unit, ctx.catalog()).ok_or_else(|| Error::Format {
            position: offset + pos,
            fragment: fragment.trim().to_string(),
            message: format!("'{}' does not convert into '{main}'", fragment.trim()),
        })?;
        unit = mixed.into();
    }
    Ok(unit)
}

fn parse_expression(text: &str, offset: usize, ctx: &UnitContext<'_>) -> Result<Unit> {
    let Tokenized { tokens, error } = tokenize(text, ctx);
    if let Some(e) = error {
        return Err(shift(e, offset));
    }
    if tokens.is_empty() {
        return Err(Error::Format {
            position: offset,
            fragment: text.to_string(),
            message: "empty unit expression".to_string(),
        });
    }
    expr::evaluate(&tokens).map_err(|e| shift(e, offset))
}

fn shift(error: Error, offset: usize) -> Error {
    match error {
        Error::Format { position, fragment, message } => Error::Format { position: position + offset, fragment, message },
        other => other,
    }
}

fn byte_index(text: &str, char_pos: usize) -> usize {
    text.char_indices().nth(char_pos).map_or(text.len(), |(b, _)| b)
}

/// A scanned number: one or more `:` segments, ending at byte `end`.
struct ScannedNumber {
    segments: Vec<f64>,
    end: usize,
    /// Character position of the second segment, for errors.
    second_segment: usize,
}

impl ScannedNumber {
    /// The value in the unit's main unit.
    fn value(&self, unit: &Unit) -> Option<f64> {
        match (unit, self.segments.as_slice()) {
            (_, [single]) => Some(*single),
            (Unit::Mixed(mixed), segments) => mixed.combine_segments(segments),
            _ => None,
        }
    }
}

fn scan_number(text: &str) -> Option<ScannedNumber> {
    let bytes = text.as_bytes();
    let mut pos = text.len() - text.trim_start().len();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let start = pos;
    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_digits = digits(pos);
    pos += int_digits;
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = digits(pos + 1);
        if frac_digits > 0 || int_digits > 0 {
            pos += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(pos + 1), Some(b'+' | b'-')));
        let exp_digits = digits(pos + 1 + sign);
        if exp_digits > 0 {
            pos += 1 + sign + exp_digits;
        }
    }
    let mut segments = vec![text[start..pos].parse::<f64>().ok()?];

    let second_segment = text[..pos].chars().count() + 1;
    while bytes.get(pos) == Some(&(SEGMENT_SEPARATOR as u8)) {
        let seg_start = pos + 1;
        let mut seg_end = seg_start + digits(seg_start);
        if bytes.get(seg_end) == Some(&b'.') {
            seg_end += 1 + digits(seg_end + 1);
        }
        let Ok(segment) = text[seg_start..seg_end].parse::<f64>() else { break };
        segments.push(segment);
        pos = seg_end;
    }
    Some(ScannedNumber { segments, end: pos, second_segment })
}
