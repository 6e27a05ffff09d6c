//! Row to entity conversion
//!
//! The stream adapter never looks inside a [`Row`]; it hands every row to a
//! conversion hook exactly once. Hooks are plain functions wrapped in a
//! [`Converter`], either written by hand, derived from a [`FromRow`] impl,
//! or built by [`json_converter`] for serde types.

pub mod from_value;
pub mod json;

pub use from_value::FromValue;
pub use json::json_converter;

use crate::common::error::ConversionError;
use crate::types::Row;
use std::sync::Arc;

/// Conversion hook invoked once per arriving row
///
/// Must be pure: no blocking, no I/O. It runs inside the adapter's critical
/// section.
pub type Converter<E> = Arc<dyn Fn(Row) -> Result<E, ConversionError> + Send + Sync>;

/// Types that can be built from a single result row
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self, ConversionError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, ConversionError> {
        Ok(row)
    }
}

/// Wrap a closure as a [`Converter`]
pub fn converter<E, F>(f: F) -> Converter<E>
where
    F: Fn(Row) -> Result<E, ConversionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Converter that delegates to `E::from_row`
pub fn from_row_converter<E: FromRow + 'static>() -> Converter<E> {
    Arc::new(E::from_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct User {
        id: i32,
        name: String,
    }

    impl FromRow for User {
        fn from_row(row: Row) -> Result<Self, ConversionError> {
            Ok(User {
                id: row.get("id")?,
                name: row.get("name")?,
            })
        }
    }

    #[test]
    fn test_from_row_converter() {
        let convert = from_row_converter::<User>();
        let user = convert(Row::new().with("id", 1).with("name", "John")).unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "John".to_string()
            }
        );

        let err = convert(Row::new().with("id", 1)).unwrap_err();
        assert_eq!(err.column.as_deref(), Some("name"));
    }

    #[test]
    fn test_closure_converter() {
        let convert = converter(|row: Row| row.get::<i64>("n").map(|n| n * 2));
        assert_eq!(convert(Row::new().with("n", 21)).unwrap(), 42);
    }

    #[test]
    fn test_identity_conversion() {
        let row = Row::new().with("a", true);
        assert_eq!(Row::from_row(row.clone()).unwrap(), row);
    }
}
