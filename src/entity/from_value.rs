//! Typed extraction of single field values

use crate::common::error::ConversionError;
use crate::types::Value;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Types that can be read out of a single [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_boolean()
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_i16()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_i32()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_f64()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.try_as_string()
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Blob(bytes) => Ok(bytes.clone()),
            other => Err(mismatch("blob", other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(date) => Ok(*date),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Date(date) => date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| ConversionError::new(format!("invalid date {}", date))),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(uuid) => Ok(*uuid),
            Value::Varchar(text) => Uuid::parse_str(text)
                .map_err(|err| ConversionError::new(format!("invalid uuid '{}': {}", text, err))),
            other => Err(mismatch("uuid", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.to_json())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

fn mismatch(target: &str, value: &Value) -> ConversionError {
    ConversionError::new(format!(
        "Cannot extract {} from {}",
        target,
        value.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_handles_null() {
        assert_eq!(Option::<i32>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(&Value::Integer(5)).unwrap(), Some(5));
        assert!(i32::from_value(&Value::Null).is_err());
    }

    #[test]
    fn test_temporal_values() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        assert_eq!(NaiveDate::from_value(&Value::Date(date)).unwrap(), date);

        let midnight = NaiveDateTime::from_value(&Value::Date(date)).unwrap();
        assert_eq!(midnight.date(), date);
        assert!(NaiveDate::from_value(&Value::from("2023-07-01")).is_err());
    }

    #[test]
    fn test_uuid_from_text() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(&Value::from(id.to_string())).unwrap(), id);
        assert_eq!(Uuid::from_value(&Value::Uuid(id)).unwrap(), id);

        let err = Uuid::from_value(&Value::from("not-a-uuid")).unwrap_err();
        assert!(err.message.starts_with("invalid uuid 'not-a-uuid'"));
    }

    #[test]
    fn test_blob() {
        assert_eq!(
            Vec::<u8>::from_value(&Value::Blob(vec![0xde, 0xad])).unwrap(),
            vec![0xde, 0xad]
        );
        assert!(Vec::<u8>::from_value(&Value::Integer(1)).is_err());
    }
}
