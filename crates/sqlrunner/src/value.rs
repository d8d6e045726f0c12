//! Untyped positional values and the conversion traits around them.
//!
//! Every argument bound to a `?` placeholder and every column read back from a
//! result row is a [`Value`]. Rust types cross that boundary through
//! [`ToValue`] (infallible) and [`FromValue`] (fallible, reports a decode error).

use crate::error::{RunnerError, RunnerResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single SQL value, as bound to a placeholder or read from a column.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    fn mismatch(&self, target: &str) -> RunnerError {
        RunnerError::decode("", format!("cannot decode {} as {}", self.kind(), target))
    }
}

/// Convert a Rust value into a [`Value`] for binding.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Convert a [`Value`] read from a row into a Rust value.
///
/// NULL only decodes into `Option<T>` (and `Value` itself).
pub trait FromValue: Sized {
    fn from_value(value: Value) -> RunnerResult<Self>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> RunnerResult<Self> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Text(ref s) => match s.as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(value.mismatch("bool")),
            },
            other => Err(other.mismatch("bool")),
        }
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Bool(b) => Ok(i64::from(b)),
            // i64::MIN and 2^63 are exact as f64
            Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(f as i64)
            }
            Value::Text(ref s) => s.trim().parse().map_err(|_| value.mismatch("i64")),
            other => Err(other.mismatch("i64")),
        }
    }
}

macro_rules! impl_small_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value) -> RunnerResult<Self> {
                    let n = i64::from_value(value)?;
                    <$t>::try_from(n).map_err(|_| {
                        RunnerError::decode("", format!("{} is out of range for {}", n, stringify!($t)))
                    })
                }
            }
        )*
    };
}

impl_small_int!(i8, i16, i32, u8, u16, u32);

macro_rules! impl_wide_uint {
    ($($t:ty),* $(,)?) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .unwrap_or_else(|_| Value::Text(self.to_string()))
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value) -> RunnerResult<Self> {
                    match value {
                        Value::Text(ref s) => s.trim().parse().map_err(|_| value.mismatch(stringify!($t))),
                        other => {
                            let n = i64::from_value(other)?;
                            <$t>::try_from(n).map_err(|_| {
                                RunnerError::decode("", format!("{} is out of range for {}", n, stringify!($t)))
                            })
                        }
                    }
                }
            }
        )*
    };
}

impl_wide_uint!(u64, usize);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Text(ref s) => s.trim().parse().map_err(|_| value.mismatch("f64")),
            other => Err(other.mismatch("f64")),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> RunnerResult<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b)
                .map_err(|e| RunnerError::decode("", format!("invalid utf-8: {e}"))),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Err(Value::Null.mismatch("String")),
        }
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(other.mismatch("bytes")),
        }
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(ref s) => uuid::Uuid::parse_str(s).map_err(|_| value.mismatch("uuid")),
            Value::Bytes(ref b) => uuid::Uuid::from_slice(b).map_err(|_| value.mismatch("uuid")),
            other => Err(other.mismatch("uuid")),
        }
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Text(self.format(DATETIME_FORMAT).to_string())
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(ref s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .map_err(|_| value.mismatch("NaiveDateTime")),
            other => Err(other.mismatch("NaiveDateTime")),
        }
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Text(self.format(DATE_FORMAT).to_string())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(ref s) => {
                NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| value.mismatch("NaiveDate"))
            }
            other => Err(other.mismatch("NaiveDate")),
        }
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_rfc3339())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(ref s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| NaiveDateTime::from_value(value.clone()).map(|naive| naive.and_utc()))
                .map_err(|_| value.mismatch("DateTime<Utc>")),
            Value::Int(secs) => {
                DateTime::from_timestamp(secs, 0).ok_or_else(|| value.mismatch("DateTime<Utc>"))
            }
            other => Err(other.mismatch("DateTime<Utc>")),
        }
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> RunnerResult<Self> {
        match value {
            Value::Text(s) => serde_json::from_str(&s)
                .map_err(|e| RunnerError::decode("", format!("invalid json: {e}"))),
            Value::Bytes(b) => serde_json::from_slice(&b)
                .map_err(|e| RunnerError::decode("", format!("invalid json: {e}"))),
            Value::Int(i) => Ok(serde_json::Value::from(i)),
            Value::Float(f) => Ok(serde_json::Value::from(f)),
            Value::Bool(b) => Ok(serde_json::Value::from(b)),
            Value::Null => Ok(serde_json::Value::Null),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_from_for_value!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String, Vec<u8>);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: ToValue> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_decodes_into_option() {
        assert!(String::from_value(Value::Null).is_err());
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i32>::from_value(Value::Int(7)).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn narrow_integers_reject_out_of_range() {
        assert_eq!(u8::from_value(Value::Int(255)).unwrap(), 255);
        let err = u8::from_value(Value::Int(256)).unwrap_err();
        assert!(matches!(err, RunnerError::Decode { .. }));
    }

    #[test]
    fn floats_decode_to_i64_only_when_whole_and_in_range() {
        assert_eq!(i64::from_value(Value::Float(42.0)).unwrap(), 42);
        assert_eq!(i64::from_value(Value::Float(-9.007e15)).unwrap(), -9_007_000_000_000_000);
        assert!(i64::from_value(Value::Float(1.5)).is_err());
        assert!(i64::from_value(Value::Float(1e300)).is_err());
        assert!(i64::from_value(Value::Float(9.223_372_036_854_775_808e18)).is_err());
        assert!(i64::from_value(Value::Float(f64::NAN)).is_err());
        assert!(i32::from_value(Value::Float(-1e19)).is_err());
    }

    #[test]
    fn text_numbers_decode() {
        assert_eq!(i64::from_value(Value::Text("42".into())).unwrap(), 42);
        assert_eq!(f64::from_value(Value::Text("1.5".into())).unwrap(), 1.5);
    }

    #[test]
    fn uuid_is_bound_as_hyphenated_text() {
        let id = uuid::Uuid::nil();
        let v = id.to_value();
        assert_eq!(v, Value::Text("00000000-0000-0000-0000-000000000000".into()));
        assert_eq!(uuid::Uuid::from_value(v).unwrap(), id);
    }

    #[test]
    fn naive_datetime_keeps_fractional_seconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 4, 5, 120_000)
            .unwrap();
        assert_eq!(NaiveDateTime::from_value(dt.to_value()).unwrap(), dt);
    }

    #[test]
    fn utc_datetime_accepts_sqlite_style_text() {
        let parsed = DateTime::<Utc>::from_value(Value::Text("2024-01-02 03:04:05".into())).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[test]
    fn json_values_travel_as_text() {
        let json = serde_json::json!({"a": [1, 2]});
        let v = json.to_value();
        assert!(matches!(v, Value::Text(_)));
        assert_eq!(serde_json::Value::from_value(v).unwrap(), json);
    }

    #[test]
    fn serializes_untagged() {
        let args = vec![Value::Int(1), Value::Text("a".into()), Value::Null];
        assert_eq!(serde_json::to_string(&args).unwrap(), r#"[1,"a",null]"#);
    }
}
