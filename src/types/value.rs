use crate::common::error::ConversionError;
use crate::conversion_err;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single field value as emitted by the database driver
/// Values are the fundamental unit of data in a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value (type is not tracked)
    Null,
    /// Boolean value
    Boolean(bool),
    /// 16-bit signed integer
    SmallInt(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// 64-bit double precision
    Double(f64),
    /// String value
    Varchar(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// UUID value
    Uuid(Uuid),
    /// JSON document
    Json(serde_json::Value),
    /// Binary data
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL name of the value's type, used in conversion messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::SmallInt(_) => "SMALLINT",
            Value::Integer(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Double(_) => "DOUBLE",
            Value::Varchar(_) => "VARCHAR",
            Value::Date(_) => "DATE",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Uuid(_) => "UUID",
            Value::Json(_) => "JSON",
            Value::Blob(_) => "BLOB",
        }
    }

    fn mismatch(&self, target: &str) -> ConversionError {
        conversion_err!("Cannot extract {} from {}", target, self.type_name())
    }

    /// Try to extract a boolean value
    pub fn try_as_boolean(&self) -> Result<bool, ConversionError> {
        match self {
            Value::Boolean(value) => Ok(*value),
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// Try to extract an i16 value
    pub fn try_as_i16(&self) -> Result<i16, ConversionError> {
        match self {
            Value::SmallInt(value) => Ok(*value),
            Value::Integer(value) => i16::try_from(*value)
                .map_err(|_| ConversionError::new(format!("{} overflows i16", value))),
            Value::BigInt(value) => i16::try_from(*value)
                .map_err(|_| ConversionError::new(format!("{} overflows i16", value))),
            _ => Err(self.mismatch("i16")),
        }
    }

    /// Try to extract an i32 value
    pub fn try_as_i32(&self) -> Result<i32, ConversionError> {
        match self {
            Value::Integer(value) => Ok(*value),
            Value::SmallInt(value) => Ok(*value as i32),
            Value::BigInt(value) => i32::try_from(*value)
                .map_err(|_| ConversionError::new(format!("{} overflows i32", value))),
            _ => Err(self.mismatch("i32")),
        }
    }

    /// Try to extract an i64 value
    pub fn try_as_i64(&self) -> Result<i64, ConversionError> {
        match self {
            Value::BigInt(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as i64),
            Value::SmallInt(value) => Ok(*value as i64),
            _ => Err(self.mismatch("i64")),
        }
    }

    /// Try to extract an f64 value
    pub fn try_as_f64(&self) -> Result<f64, ConversionError> {
        match self {
            Value::Double(value) => Ok(*value),
            Value::BigInt(value) => Ok(*value as f64),
            Value::Integer(value) => Ok(*value as f64),
            Value::SmallInt(value) => Ok(*value as f64),
            _ => Err(self.mismatch("f64")),
        }
    }

    /// Try to extract a string value
    pub fn try_as_string(&self) -> Result<String, ConversionError> {
        match self {
            Value::Varchar(value) => Ok(value.clone()),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Render the value as a JSON value for serde-based entity mapping
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(value) => serde_json::Value::from(*value),
            Value::SmallInt(value) => serde_json::Value::from(*value),
            Value::Integer(value) => serde_json::Value::from(*value),
            Value::BigInt(value) => serde_json::Value::from(*value),
            // NaN and infinities have no JSON form and map to null
            Value::Double(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Varchar(value) => serde_json::Value::from(value.as_str()),
            Value::Date(value) => serde_json::Value::from(value.to_string()),
            Value::Timestamp(value) => {
                serde_json::Value::from(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::Uuid(value) => serde_json::Value::from(value.to_string()),
            Value::Json(value) => value.clone(),
            Value::Blob(value) => serde_json::Value::from(value.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::SmallInt(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Varchar(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::SmallInt(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::BigInt(value) => write!(f, "{}", value),
            Value::Double(value) => write!(f, "{}", value),
            Value::Varchar(value) => write!(f, "'{}'", value),
            Value::Date(value) => write!(f, "DATE({})", value),
            Value::Timestamp(value) => write!(f, "TIMESTAMP({})", value),
            Value::Uuid(value) => write!(f, "UUID({})", value),
            Value::Json(value) => write!(f, "JSON({})", value),
            Value::Blob(value) => write!(f, "BLOB({} bytes)", value.len()),
        }
    }
}
