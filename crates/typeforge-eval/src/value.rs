//! Dynamic runtime values.
//!
//! [`Value`] covers both what `json.loads` produces (`None`, `bool`, `int`,
//! `float`, `str`, `list`, `dict`) and what the generated classes hold after
//! decoding (date-times, enum members, class instances).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{EvalError, EvalResult};

/// A parsed date-time.  Python keeps timezone-naive and aware values apart,
/// and `isoformat()` only prints an offset for aware ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parse the ISO 8601 forms JSON date-times use.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let s = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Timestamp::Aware(dt));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Timestamp::Naive(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Timestamp::Naive(dt));
            }
        }
        Err(EvalError::Parse {
            kind: "date-time",
            input: input.to_string(),
        })
    }

    /// The string `datetime.isoformat()` returns.  Python stores
    /// microseconds, so finer digits are truncated and a nonzero fraction
    /// always prints six digits.
    pub fn isoformat(&self) -> String {
        match self {
            Timestamp::Aware(dt) => format!(
                "{}{}{}",
                dt.format("%Y-%m-%dT%H:%M:%S"),
                microsecond_fraction(dt.nanosecond()),
                dt.format("%:z")
            ),
            Timestamp::Naive(dt) => format!(
                "{}{}",
                dt.format("%Y-%m-%dT%H:%M:%S"),
                microsecond_fraction(dt.nanosecond())
            ),
        }
    }
}

fn microsecond_fraction(nanos: u32) -> String {
    // chrono encodes a leap second as nanos >= 1_000_000_000
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros == 0 {
        String::new()
    } else {
        format!(".{micros:06}")
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    DateTime(Timestamp),
    /// A member of a generated enum class.
    Enum { enumeration: String, case: String },
    /// An instance of a generated class, attributes keyed by JSON property name.
    Object {
        class: String,
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// The Python type name, for error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::List(_) => "list".into(),
            Value::Dict(_) => "dict".into(),
            Value::DateTime(_) => "datetime".into(),
            Value::Enum { enumeration, .. } => enumeration.clone(),
            Value::Object { class, .. } => class.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The value `json.loads` would produce for `json`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// The JSON `json.dumps` would write.  Only plain JSON shapes qualify.
    pub fn to_json(&self) -> EvalResult<serde_json::Value> {
        Ok(match self {
            Value::None => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| EvalError::NotJson(format!("float {f}")))?,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<EvalResult<_>>()?,
            ),
            Value::Dict(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<EvalResult<_>>()?,
            ),
            other => return Err(EvalError::NotJson(other.type_name())),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Dict(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::DateTime(ts) => write!(f, "datetime({})", ts.isoformat()),
            Value::Enum { enumeration, case } => write!(f, "{enumeration}({case:?})"),
            Value::Object { class, .. } => write!(f, "<{class} object>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_shapes() {
        let v = Value::from_json(&json!({"a": [1, 2.5, null, true, "s"]}));
        let Value::Dict(map) = &v else { panic!("expected dict") };
        assert_eq!(
            map["a"],
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::None,
                Value::Bool(true),
                Value::str("s"),
            ])
        );
        assert_eq!(v.to_json().unwrap(), json!({"a": [1, 2.5, null, true, "s"]}));
    }

    #[test]
    fn decoded_objects_are_not_json() {
        let v = Value::Enum {
            enumeration: "Color".into(),
            case: "red".into(),
        };
        assert_eq!(v.to_json(), Err(EvalError::NotJson("Color".into())));
        assert!(Value::Float(f64::NAN).to_json().is_err());
    }

    #[test]
    fn fractions_print_microseconds() {
        let short = Timestamp::parse("2021-03-04T05:06:07.25Z").unwrap();
        assert_eq!(short.isoformat(), "2021-03-04T05:06:07.250000+00:00");
        let fine = Timestamp::parse("2021-03-04T05:06:07.123456789").unwrap();
        assert_eq!(fine.isoformat(), "2021-03-04T05:06:07.123456");
        let sub_micro = Timestamp::parse("2021-03-04T05:06:07.0000004Z").unwrap();
        assert_eq!(sub_micro.isoformat(), "2021-03-04T05:06:07+00:00");
        let whole = Timestamp::parse("2021-03-04T05:06:07.000Z").unwrap();
        assert_eq!(whole.isoformat(), "2021-03-04T05:06:07+00:00");
    }

    #[test]
    fn timestamps_keep_their_offset() {
        let aware = Timestamp::parse("2021-03-04T05:06:07+02:00").unwrap();
        assert_eq!(aware.isoformat(), "2021-03-04T05:06:07+02:00");
        let fraction = Timestamp::parse("2021-03-04T05:06:07.250Z").unwrap();
        assert_eq!(fraction.isoformat(), "2021-03-04T05:06:07.250000+00:00");
        let naive = Timestamp::parse("2021-03-04T05:06:07").unwrap();
        assert_eq!(naive.isoformat(), "2021-03-04T05:06:07");
        let date = Timestamp::parse("2021-03-04").unwrap();
        assert_eq!(date.isoformat(), "2021-03-04T00:00:00");
        assert!(matches!(
            Timestamp::parse("yesterday"),
            Err(EvalError::Parse { kind: "date-time", .. })
        ));
    }

    #[test]
    fn display_is_pythonic() {
        let v = Value::List(vec![Value::None, Value::Bool(false), Value::str("x")]);
        assert_eq!(v.to_string(), "[None, False, \"x\"]");
    }
}
