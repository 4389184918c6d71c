//! Scalar value conversions between a unit and its primary unit.
//!
//! `convert(value, backwards)`:
//! - `backwards == false`: from the primary representation to this unit's representation
//! - `backwards == true`: the inverse
//!
//! Linear: forward `v * scale + offset`, backward `(v - offset) / scale`.

use serde::{Deserialize, Serialize};

/// A composable scalar transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueConversion {
    Identity,
    Scaled(ScaledValueConversion),
    Linear(LinearValueConversion),
    Combined(Box<CombinedValueConversion>),
}

/// Linear conversion without offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScaledRepr")]
pub struct ScaledValueConversion {
    scale: f64,
}

#[derive(Deserialize)]
struct ScaledRepr {
    scale: f64,
}

/// `to = raw * scale + offset`, `from = (raw - offset) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinearRepr")]
pub struct LinearValueConversion {
    offset: f64,
    scale: f64,
}

#[derive(Deserialize)]
struct LinearRepr {
    offset: f64,
    scale: f64,
}

/// Chains two conversions, each with its own direction flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedValueConversion {
    pub first: ValueConversion,
    pub first_inverted: bool,
    pub second: ValueConversion,
    pub second_inverted: bool,
}

fn check_scale(scale: f64) -> Result<f64, String> {
    if scale == 0.0 || !scale.is_finite() {
        Err(format!("conversion scale must be finite and non-zero, got {scale}"))
    } else {
        Ok(scale)
    }
}

impl ScaledValueConversion {
    /// Panics on a zero or non-finite scale.
    pub fn new(scale: f64) -> Self {
        Self::try_new(scale).unwrap_or_else(|msg| panic!("{msg}"))
    }

    pub fn try_new(scale: f64) -> Result<Self, String> {
        Ok(Self { scale: check_scale(scale)? })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl TryFrom<ScaledRepr> for ScaledValueConversion {
    type Error = String;

    fn try_from(r: ScaledRepr) -> Result<Self, String> {
        Self::try_new(r.scale)
    }
}

impl LinearValueConversion {
    /// Panics on a zero or non-finite scale, or a non-finite offset.
    pub fn new(offset: f64, scale: f64) -> Self {
        Self::try_new(offset, scale).unwrap_or_else(|msg| panic!("{msg}"))
    }

    pub fn try_new(offset: f64, scale: f64) -> Result<Self, String> {
        if !offset.is_finite() {
            return Err(format!("conversion offset must be finite, got {offset}"));
        }
        Ok(Self { offset, scale: check_scale(scale)? })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn convert(&self, value: f64, backwards: bool) -> f64 {
        if backwards {
            (value - self.offset) / self.scale
        } else {
            value * self.scale + self.offset
        }
    }
}

impl TryFrom<LinearRepr> for LinearValueConversion {
    type Error = String;

    fn try_from(r: LinearRepr) -> Result<Self, String> {
        Self::try_new(r.offset, r.scale)
    }
}

impl CombinedValueConversion {
    fn convert(&self, value: f64, backwards: bool) -> f64 {
        if backwards {
            let v = self.second.convert(value, !self.second_inverted);
            self.first.convert(v, !self.first_inverted)
        } else {
            let v = self.first.convert(value, self.first_inverted);
            self.second.convert(v, self.second_inverted)
        }
    }
}

impl ValueConversion {
    pub fn scaled(scale: f64) -> Self {
        ValueConversion::Scaled(ScaledValueConversion::new(scale))
    }

    pub fn linear(offset: f64, scale: f64) -> Self {
        ValueConversion::Linear(LinearValueConversion::new(offset, scale))
    }

    /// `second ∘ first`, with explicit direction flags on each side.
    pub fn combined(
        first: ValueConversion,
        first_inverted: bool,
        second: ValueConversion,
        second_inverted: bool,
    ) -> Self {
        ValueConversion::Combined(Box::new(CombinedValueConversion {
            first,
            first_inverted,
            second,
            second_inverted,
        }))
    }

    /// The inverse transform.
    pub fn inverted(self) -> Self {
        match self {
            ValueConversion::Identity => ValueConversion::Identity,
            ValueConversion::Scaled(s) => ValueConversion::scaled(1.0 / s.scale),
            other => ValueConversion::combined(other, true, ValueConversion::Identity, false),
        }
    }

    pub fn convert(&self, value: f64, backwards: bool) -> f64 {
        match self {
            ValueConversion::Identity => value,
            ValueConversion::Scaled(s) => {
                if backwards {
                    value / s.scale
                } else {
                    value * s.scale
                }
            }
            ValueConversion::Linear(l) => l.convert(value, backwards),
            ValueConversion::Combined(c) => c.convert(value, backwards),
        }
    }

    /// Slope of the transform, ignoring any offset. Used where a unit appears
    /// as a factor of a product, where offsets have no meaning.
    pub fn linear_scale(&self, backwards: bool) -> f64 {
        match self {
            ValueConversion::Identity => 1.0,
            ValueConversion::Scaled(s) if backwards => 1.0 / s.scale,
            ValueConversion::Scaled(s) => s.scale,
            _ => self.convert(1.0, backwards) - self.convert(0.0, backwards),
        }
    }

    pub fn has_offset(&self) -> bool {
        self.convert(0.0, false) != 0.0
    }
}
