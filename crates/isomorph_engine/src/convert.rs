//! Type harmonization.
//!
//! A closed set of conversion rules, evaluated in a fixed order. Each rule
//! converts the subject toward the kind of the expectation for the kind
//! pairs it declares.

use crate::error::ConversionError;
use isomorph_core::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest integer magnitude an `f64` represents exactly
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// One conversion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionRule {
    /// `i64` <-> `u64` when the value fits
    IntegerWidening,
    /// Integer -> `f64` when exactly representable
    IntegerToFloat,
    /// `f64` -> integer when the value is integral and in range
    FloatToInteger,
    /// String -> number, bool or char (culture-invariant parsing)
    StringParsing,
    /// Number, bool or char -> string
    ToStringFormatting,
}

impl ConversionRule {
    /// Lossless rules enabled by default
    pub const DEFAULT: [ConversionRule; 2] = [Self::IntegerWidening, Self::IntegerToFloat];

    /// All rules, in evaluation order
    pub const ALL: [ConversionRule; 5] = [
        Self::IntegerWidening,
        Self::IntegerToFloat,
        Self::FloatToInteger,
        Self::StringParsing,
        Self::ToStringFormatting,
    ];

    /// Whether this rule handles `from` -> `to`
    #[must_use]
    pub const fn applies(self, from: ValueKind, to: ValueKind) -> bool {
        match self {
            Self::IntegerWidening => matches!(
                (from, to),
                (ValueKind::Int, ValueKind::UInt) | (ValueKind::UInt, ValueKind::Int)
            ),
            Self::IntegerToFloat => {
                matches!(from, ValueKind::Int | ValueKind::UInt) && matches!(to, ValueKind::Float)
            }
            Self::FloatToInteger => {
                matches!(from, ValueKind::Float) && matches!(to, ValueKind::Int | ValueKind::UInt)
            }
            Self::StringParsing => {
                matches!(from, ValueKind::Str)
                    && matches!(
                        to,
                        ValueKind::Int
                            | ValueKind::UInt
                            | ValueKind::Float
                            | ValueKind::Bool
                            | ValueKind::Char
                    )
            }
            Self::ToStringFormatting => {
                matches!(
                    from,
                    ValueKind::Int
                        | ValueKind::UInt
                        | ValueKind::Float
                        | ValueKind::Bool
                        | ValueKind::Char
                ) && matches!(to, ValueKind::Str)
            }
        }
    }

    /// Convert `value` to `to`
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be converted without loss
    pub fn convert(self, value: &Value, to: ValueKind) -> Result<Value, ConversionError> {
        match (value, to) {
            (Value::Int(i), ValueKind::UInt) => u64::try_from(*i)
                .map(Value::UInt)
                .map_err(|_| ConversionError::OutOfRange {
                    value: i.to_string(),
                    to,
                }),
            (Value::UInt(u), ValueKind::Int) => i64::try_from(*u)
                .map(Value::Int)
                .map_err(|_| ConversionError::OutOfRange {
                    value: u.to_string(),
                    to,
                }),
            (Value::Int(i), ValueKind::Float) => {
                if i.unsigned_abs() <= MAX_EXACT_FLOAT_INT {
                    Ok(Value::Float(*i as f64))
                } else {
                    Err(ConversionError::Lossy {
                        value: i.to_string(),
                        to,
                    })
                }
            }
            (Value::UInt(u), ValueKind::Float) => {
                if *u <= MAX_EXACT_FLOAT_INT {
                    Ok(Value::Float(*u as f64))
                } else {
                    Err(ConversionError::Lossy {
                        value: u.to_string(),
                        to,
                    })
                }
            }
            (Value::Float(f), ValueKind::Int | ValueKind::UInt) => float_to_integer(*f, to),
            (Value::Str(s), _) => parse_str(s, to),
            (Value::Int(i), ValueKind::Str) => Ok(Value::Str(i.to_string())),
            (Value::UInt(u), ValueKind::Str) => Ok(Value::Str(u.to_string())),
            (Value::Float(f), ValueKind::Str) => Ok(Value::Str(f.to_string())),
            (Value::Bool(b), ValueKind::Str) => Ok(Value::Str(b.to_string())),
            (Value::Char(c), ValueKind::Str) => Ok(Value::Str(c.to_string())),
            (other, _) => Err(ConversionError::OutOfRange {
                value: other.type_name(),
                to,
            }),
        }
    }
}

impl fmt::Display for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IntegerWidening => "integer widening",
            Self::IntegerToFloat => "integer to float",
            Self::FloatToInteger => "float to integer",
            Self::StringParsing => "string parsing",
            Self::ToStringFormatting => "string formatting",
        };
        f.write_str(name)
    }
}

fn float_to_integer(f: f64, to: ValueKind) -> Result<Value, ConversionError> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(ConversionError::Lossy {
            value: f.to_string(),
            to,
        });
    }
    let out_of_range = || ConversionError::OutOfRange {
        value: f.to_string(),
        to,
    };
    match to {
        // i64::MAX as f64 rounds up to 2^63, which is out of range
        ValueKind::Int if f >= -(2f64.powi(63)) && f < 2f64.powi(63) => Ok(Value::Int(f as i64)),
        ValueKind::UInt if f >= 0.0 && f < 2f64.powi(64) => Ok(Value::UInt(f as u64)),
        _ => Err(out_of_range()),
    }
}

fn parse_str(s: &str, to: ValueKind) -> Result<Value, ConversionError> {
    let unparsable = || ConversionError::Unparsable {
        value: s.to_string(),
        to,
    };
    match to {
        ValueKind::Int => s.parse().map(Value::Int).map_err(|_| unparsable()),
        ValueKind::UInt => s.parse().map(Value::UInt).map_err(|_| unparsable()),
        ValueKind::Float => s.parse().map(Value::Float).map_err(|_| unparsable()),
        ValueKind::Bool => s.parse().map(Value::Bool).map_err(|_| unparsable()),
        ValueKind::Char => s.parse().map(Value::Char).map_err(|_| unparsable()),
        _ => Err(unparsable()),
    }
}

/// Convert `subject` toward `target` with the first applicable rule.
///
/// Returns `None` when no rule handles the kind pair.
pub fn harmonize(
    rules: &[ConversionRule],
    subject: &Value,
    target: ValueKind,
) -> Option<Result<Value, ConversionError>> {
    let from = subject.kind();
    if from == target {
        return Some(Ok(subject.clone()));
    }
    ConversionRule::ALL
        .iter()
        .filter(|rule| rules.contains(rule))
        .find(|rule| rule.applies(from, target))
        .map(|rule| rule.convert(subject, target))
}
