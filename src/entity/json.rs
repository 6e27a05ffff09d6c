//! Field-by-name entity mapping through serde
//!
//! Builds a JSON object out of a row (optionally stripping the query
//! builder's `Entity_` alias prefix first) and deserializes the target type
//! from it. Any deserialization failure becomes a [`ConversionError`], so a
//! row is either mapped completely or not at all.

use super::Converter;
use crate::common::error::ConversionError;
use crate::types::Row;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Build a converter that maps row columns onto the fields of `T` by name
pub fn json_converter<T>(prefix: Option<&str>) -> Converter<T>
where
    T: DeserializeOwned + 'static,
{
    let prefix = prefix.map(str::to_string);
    Arc::new(move |row: Row| {
        let row = match &prefix {
            Some(prefix) => row.strip_prefix(prefix),
            None => row,
        };
        let object = serde_json::Value::Object(row.to_json_object());
        serde_json::from_value(object).map_err(|err| ConversionError::new(err.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestEntity {
        id: i32,
        name: String,
        #[serde(default)]
        joined: Option<NaiveDate>,
    }

    #[test]
    fn test_maps_prefixed_columns() {
        let convert = json_converter::<TestEntity>(Some("TestEntity"));
        let row = Row::new()
            .with("TestEntity_id", 1)
            .with("TestEntity_name", "John")
            .with(
                "TestEntity_joined",
                NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            );

        let entity = convert(row).unwrap();
        assert_eq!(entity.id, 1);
        assert_eq!(entity.name, "John");
        assert_eq!(entity.joined, NaiveDate::from_ymd_opt(2020, 1, 15));
    }

    #[test]
    fn test_unprefixed_and_null_fields() {
        let convert = json_converter::<TestEntity>(None);
        let row = Row::new()
            .with("id", 2)
            .with("name", "Jane")
            .with("joined", Value::Null);
        assert_eq!(
            convert(row).unwrap(),
            TestEntity {
                id: 2,
                name: "Jane".to_string(),
                joined: None
            }
        );
    }

    #[test]
    fn test_type_mismatch_is_conversion_error() {
        let convert = json_converter::<TestEntity>(None);
        let err = convert(Row::new().with("id", "one").with("name", "John")).unwrap_err();
        assert!(err.message.contains("invalid type"), "{}", err);

        let err = convert(Row::new().with("id", 3)).unwrap_err();
        assert!(err.message.contains("missing field `name`"), "{}", err);
    }
}
