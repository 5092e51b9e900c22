//! The coercion whitelist.
//!
//! Every conversion between cell types is an enumerated [`CoercionRule`]. A value
//! whose type differs from its column is accepted only if an enabled rule covers
//! the pair and the conversion is exact.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::IntErrorKind;

use crate::column::ColumnType;
use crate::error::MismatchReason;
use crate::value::Value;

/// Largest integer magnitude an f64 represents exactly.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// One allowed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionRule {
    IntegerToFloat,
    FloatToInteger,
    TextToInteger,
    TextToFloat,
    TextToBoolean,
    TextToTimestamp,
    TextToBinary,
    IntegerToTimestamp,
    TimestampToInteger,
    ToText,
    BinaryToText,
    EmptyTextToNull,
}

impl CoercionRule {
    pub const ALL: [CoercionRule; 12] = [
        CoercionRule::IntegerToFloat,
        CoercionRule::FloatToInteger,
        CoercionRule::TextToInteger,
        CoercionRule::TextToFloat,
        CoercionRule::TextToBoolean,
        CoercionRule::TextToTimestamp,
        CoercionRule::TextToBinary,
        CoercionRule::IntegerToTimestamp,
        CoercionRule::TimestampToInteger,
        CoercionRule::ToText,
        CoercionRule::BinaryToText,
        CoercionRule::EmptyTextToNull,
    ];
}

/// The set of enabled coercion rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoercionPolicy {
    rules: BTreeSet<CoercionRule>,
}

impl Default for CoercionPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl CoercionPolicy {
    /// Every rule enabled.
    pub fn all() -> Self {
        Self {
            rules: CoercionRule::ALL.into_iter().collect(),
        }
    }

    /// Strict mode: only exact type matches are accepted.
    pub fn none() -> Self {
        Self {
            rules: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, rule: CoercionRule) -> Self {
        self.rules.insert(rule);
        self
    }

    #[must_use]
    pub fn without(mut self, rule: CoercionRule) -> Self {
        self.rules.remove(&rule);
        self
    }

    pub fn allows(&self, rule: CoercionRule) -> bool {
        self.rules.contains(&rule)
    }

    pub fn rules(&self) -> impl Iterator<Item = CoercionRule> + '_ {
        self.rules.iter().copied()
    }

    /// Convert a non-null value whose type differs from `target`.
    ///
    /// May return `Value::Null` when blank text is mapped to null; the caller
    /// decides whether the column accepts it.
    pub fn coerce(&self, value: &Value, target: ColumnType) -> Result<Value, MismatchReason> {
        if let Value::String(text) = value
            && target != ColumnType::String
            && text.trim().is_empty()
            && self.allows(CoercionRule::EmptyTextToNull)
        {
            return Ok(Value::Null);
        }

        match (value, target) {
            (Value::Integer(v), ColumnType::Float) => {
                self.require(CoercionRule::IntegerToFloat)?;
                integer_to_float(*v)
            }
            (Value::Float(v), ColumnType::Integer) => {
                self.require(CoercionRule::FloatToInteger)?;
                float_to_integer(*v)
            }
            (Value::String(text), ColumnType::Integer) => {
                self.require(CoercionRule::TextToInteger)?;
                parse_integer(text)
            }
            (Value::String(text), ColumnType::Float) => {
                self.require(CoercionRule::TextToFloat)?;
                parse_float(text)
            }
            (Value::String(text), ColumnType::Boolean) => {
                self.require(CoercionRule::TextToBoolean)?;
                parse_boolean(text)
            }
            (Value::String(text), ColumnType::Timestamp) => {
                self.require(CoercionRule::TextToTimestamp)?;
                parse_timestamp(text)
            }
            (Value::String(text), ColumnType::Binary) => {
                self.require(CoercionRule::TextToBinary)?;
                parse_binary(text)
            }
            (Value::Integer(v), ColumnType::Timestamp) => {
                self.require(CoercionRule::IntegerToTimestamp)?;
                Ok(Value::Timestamp(*v))
            }
            (Value::Timestamp(v), ColumnType::Integer) => {
                self.require(CoercionRule::TimestampToInteger)?;
                Ok(Value::Integer(*v))
            }
            (
                Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Timestamp(_),
                ColumnType::String,
            ) => {
                self.require(CoercionRule::ToText)?;
                Ok(Value::String(value.to_string()))
            }
            (Value::Binary(bytes), ColumnType::String) => {
                self.require(CoercionRule::BinaryToText)?;
                String::from_utf8(bytes.clone())
                    .map(Value::String)
                    .map_err(|_| MismatchReason::Unparseable {
                        input: value.to_string(),
                    })
            }
            _ => Err(MismatchReason::NoRule),
        }
    }

    fn require(&self, rule: CoercionRule) -> Result<(), MismatchReason> {
        if self.allows(rule) {
            Ok(())
        } else {
            Err(MismatchReason::NoRule)
        }
    }
}

fn integer_to_float(v: i64) -> Result<Value, MismatchReason> {
    if v.unsigned_abs() <= MAX_EXACT_INTEGER {
        Ok(Value::Float(v as f64))
    } else {
        Err(MismatchReason::Lossy)
    }
}

fn float_to_integer(v: f64) -> Result<Value, MismatchReason> {
    // i64::MAX is not representable; 2^63 is the first float past the range.
    if !v.is_finite() || v < -9_223_372_036_854_775_808.0 || v >= 9_223_372_036_854_775_808.0 {
        return Err(MismatchReason::OutOfRange {
            input: format!("{v:?}"),
        });
    }
    if v.fract() != 0.0 {
        return Err(MismatchReason::Lossy);
    }
    Ok(Value::Integer(v as i64))
}

fn parse_integer(text: &str) -> Result<Value, MismatchReason> {
    let trimmed = text.trim();
    trimmed.parse::<i64>().map(Value::Integer).map_err(|err| {
        let input = trimmed.to_string();
        match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                MismatchReason::OutOfRange { input }
            }
            _ => MismatchReason::Unparseable { input },
        }
    })
}

fn parse_float(text: &str) -> Result<Value, MismatchReason> {
    let trimmed = text.trim();
    let input = trimmed.to_string();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Value::Float(v)),
        Ok(v) if v.is_nan() => Err(MismatchReason::Unparseable { input }),
        Ok(_) => Err(MismatchReason::OutOfRange { input }),
        Err(_) => Err(MismatchReason::Unparseable { input }),
    }
}

fn parse_boolean(text: &str) -> Result<Value, MismatchReason> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(Value::Boolean(true)),
        "false" | "0" | "no" | "n" => Ok(Value::Boolean(false)),
        _ => Err(MismatchReason::Unparseable {
            input: text.trim().to_string(),
        }),
    }
}

/// Parse text as a UTC timestamp in microseconds.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (also with a `T` separator) and a
/// bare `YYYY-MM-DD`. Zone-less forms are read as UTC.
pub fn parse_timestamp_micros(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_micros());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc().timestamp_micros());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_micros())
}

fn parse_timestamp(text: &str) -> Result<Value, MismatchReason> {
    parse_timestamp_micros(text)
        .map(Value::Timestamp)
        .ok_or_else(|| MismatchReason::Unparseable {
            input: text.trim().to_string(),
        })
}

fn parse_binary(text: &str) -> Result<Value, MismatchReason> {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(digits) => hex::decode(digits)
            .map(Value::Binary)
            .map_err(|_| MismatchReason::Unparseable {
                input: trimmed.to_string(),
            }),
        None => Ok(Value::Binary(text.as_bytes().to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_accepts_largest_finite_float_text() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&text("1.7976931348623157e308"), ColumnType::Float),
            Ok(Value::Float(f64::MAX))
        );
        assert_eq!(
            policy.coerce(&text("1.8e308"), ColumnType::Float),
            Err(MismatchReason::OutOfRange {
                input: "1.8e308".to_string()
            })
        );
    }

    #[test]
    fn test_integer_to_float_must_be_exact() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&Value::Integer(1 << 53), ColumnType::Float),
            Ok(Value::Float(9_007_199_254_740_992.0))
        );
        assert_eq!(
            policy.coerce(&Value::Integer((1 << 53) + 1), ColumnType::Float),
            Err(MismatchReason::Lossy)
        );
    }

    #[test]
    fn test_float_to_integer_rejects_fractions_and_overflow() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&Value::Float(3.0), ColumnType::Integer),
            Ok(Value::Integer(3))
        );
        assert_eq!(
            policy.coerce(&Value::Float(3.5), ColumnType::Integer),
            Err(MismatchReason::Lossy)
        );
        assert!(matches!(
            policy.coerce(&Value::Float(1e19), ColumnType::Integer),
            Err(MismatchReason::OutOfRange { .. })
        ));
        assert!(matches!(
            policy.coerce(&Value::Float(f64::NAN), ColumnType::Integer),
            Err(MismatchReason::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_text_to_integer_distinguishes_overflow() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&text(" 42 "), ColumnType::Integer),
            Ok(Value::Integer(42))
        );
        assert!(matches!(
            policy.coerce(&text("99999999999999999999"), ColumnType::Integer),
            Err(MismatchReason::OutOfRange { .. })
        ));
        assert!(matches!(
            policy.coerce(&text("x"), ColumnType::Integer),
            Err(MismatchReason::Unparseable { .. })
        ));
    }

    #[test]
    fn test_text_to_boolean_and_timestamp() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&text("Yes"), ColumnType::Boolean),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            policy.coerce(&text("1970-01-02"), ColumnType::Timestamp),
            Ok(Value::Timestamp(86_400_000_000))
        );
        assert_eq!(
            policy.coerce(&text("1970-01-01 00:00:01.25"), ColumnType::Timestamp),
            Ok(Value::Timestamp(1_250_000))
        );
        assert_eq!(
            policy.coerce(&text("1970-01-01T01:00:00+01:00"), ColumnType::Timestamp),
            Ok(Value::Timestamp(0))
        );
    }

    #[test]
    fn test_text_to_binary_reads_hex_prefix() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&text("0xCAFE"), ColumnType::Binary),
            Ok(Value::Binary(vec![0xca, 0xfe]))
        );
        assert_eq!(
            policy.coerce(&text("ab"), ColumnType::Binary),
            Ok(Value::Binary(b"ab".to_vec()))
        );
        assert!(policy.coerce(&text("0xZZ"), ColumnType::Binary).is_err());
    }

    #[test]
    fn test_blank_text_becomes_null_for_non_string_targets() {
        let policy = CoercionPolicy::default();
        assert_eq!(
            policy.coerce(&text("  "), ColumnType::Integer),
            Ok(Value::Null)
        );
        let strict = policy.without(CoercionRule::EmptyTextToNull);
        assert!(matches!(
            strict.coerce(&text("  "), ColumnType::Integer),
            Err(MismatchReason::Unparseable { .. })
        ));
    }

    #[test]
    fn test_disabled_rules_reject() {
        let policy = CoercionPolicy::none();
        assert_eq!(
            policy.coerce(&text("1"), ColumnType::Integer),
            Err(MismatchReason::NoRule)
        );
        let policy = policy.with(CoercionRule::TextToInteger);
        assert_eq!(
            policy.coerce(&text("1"), ColumnType::Integer),
            Ok(Value::Integer(1))
        );
        assert_eq!(
            policy.coerce(&Value::Boolean(true), ColumnType::Integer),
            Err(MismatchReason::NoRule)
        );
    }

    #[test]
    fn test_policy_serializes_as_rule_list() {
        let policy = CoercionPolicy::none()
            .with(CoercionRule::ToText)
            .with(CoercionRule::IntegerToFloat);
        let json = serde_json::to_string(&policy).unwrap();
        insta::assert_snapshot!(json, @r#"["integer_to_float","to_text"]"#);
    }
}
