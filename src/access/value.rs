use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Floats in `[I64_MIN_F64, I64_END_F64)` convert to `i64` without saturating
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_END_F64: f64 = -(i64::MIN as f64);

/// Column types known to the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Varchar,
}

/// A value could not be converted to a column type
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot cast {value} to {target:?}")]
pub struct CastError {
    pub value: Value,
    pub target: DataType,
}

impl DataType {
    /// Cast a value into the representation stored for this type.
    ///
    /// `Null` is valid for every type and is returned unchanged.
    pub fn cast(&self, value: &Value) -> Result<Value, CastError> {
        let fail = || CastError {
            value: value.clone(),
            target: *self,
        };

        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            DataType::Boolean => match value {
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                Value::Int32(0) | Value::Int64(0) => Ok(Value::Boolean(false)),
                Value::Int32(1) | Value::Int64(1) => Ok(Value::Boolean(true)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "t" | "true" | "1" | "yes" | "on" => Ok(Value::Boolean(true)),
                    "f" | "false" | "0" | "no" | "off" => Ok(Value::Boolean(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },

            DataType::Int32 => value
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::Int32)
                .ok_or_else(fail),

            DataType::Int64 => value.as_i64().map(Value::Int64).ok_or_else(fail),

            DataType::Float64 => match value {
                Value::Int32(i) => Ok(Value::Float64(f64::from(*i))),
                Value::Int64(i) => Ok(Value::Float64(*i as f64)),
                Value::Float64(f) if f.is_finite() => Ok(Value::Float64(*f)),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Float64)
                    .ok_or_else(fail),
                _ => Err(fail()),
            },

            DataType::Varchar => match value {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::Boolean(b) => Ok(Value::String(b.to_string())),
                Value::Int32(i) => Ok(Value::String(i.to_string())),
                Value::Int64(i) => Ok(Value::String(i.to_string())),
                Value::Float64(f) => Ok(Value::String(f.to_string())),
                Value::Null => Ok(Value::Null),
            },
        }
    }
}

/// Scalar values that appear in filters and predicates
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
        }
    }

    /// Integer view used by the integer casts. Floats qualify only when integral.
    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            Value::Float64(f) if f.fract() == 0.0 && (I64_MIN_F64..I64_END_F64).contains(f) => {
                Some(*f as i64)
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Renders the value as a SQL literal
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}
