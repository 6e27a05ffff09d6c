//! Raw result rows
//!
//! A [`Row`] is what the database driver hands over for every record of a
//! result set: an ordered list of named fields. It is consumed exactly once
//! by a conversion hook.

use crate::common::constants::ALIAS_SEPARATOR;
use crate::common::error::ConversionError;
use crate::entity::FromValue;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};

/// An ordered sequence of named fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create a row from `(column, value)` pairs, keeping their order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    /// Append a field
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Builder-style variant of [`Row::push`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in emission order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    /// Iterate over `(column, value)` pairs in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    /// Look up a value by column name (first match wins)
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Look up a value by position
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, value)| value)
    }

    /// Extract a typed value by column name
    ///
    /// A missing column or a value of the wrong type is reported as a
    /// [`ConversionError`] naming the column.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, ConversionError> {
        let value = self
            .value(column)
            .ok_or_else(|| ConversionError::missing_column(column))?;
        T::from_value(value).map_err(|err| ConversionError::for_column(column, err.message))
    }

    /// Remove a `"{prefix}_"` alias prefix from every column that carries it
    ///
    /// Query builders alias selected columns as `Entity_field`; entity
    /// mapping wants the bare field names. Columns without the prefix are
    /// left untouched.
    pub fn strip_prefix(self, prefix: &str) -> Self {
        let mut alias = String::with_capacity(prefix.len() + 1);
        alias.push_str(prefix);
        alias.push(ALIAS_SEPARATOR);

        let fields = self
            .fields
            .into_iter()
            .map(|(column, value)| match column.strip_prefix(alias.as_str()) {
                Some(stripped) if !stripped.is_empty() => (stripped.to_string(), value),
                _ => (column, value),
            })
            .collect();
        Self { fields }
    }

    /// Render the row as a JSON object keyed by column name
    ///
    /// Duplicate column names keep the last value, as assignment by name
    /// would.
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect()
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_row() -> Row {
        Row::new()
            .with("User_id", 1)
            .with("User_name", "John")
            .with("created", Value::Null)
    }

    #[test]
    fn test_lookup_preserves_order() {
        let row = user_row();
        assert_eq!(row.len(), 3);
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["User_id", "User_name", "created"]
        );
        assert_eq!(row.value_at(1), Some(&Value::from("John")));
        assert_eq!(row.value("missing"), None);
    }

    #[test]
    fn test_typed_get() {
        let row = user_row();
        assert_eq!(row.get::<i32>("User_id").unwrap(), 1);
        assert_eq!(row.get::<Option<String>>("created").unwrap(), None);

        let err = row.get::<i32>("User_name").unwrap_err();
        assert_eq!(err.column.as_deref(), Some("User_name"));

        let err = row.get::<i32>("age").unwrap_err();
        assert_eq!(err, ConversionError::missing_column("age"));
    }

    #[test]
    fn test_strip_prefix() {
        let row = user_row().strip_prefix("User");
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["id", "name", "created"]
        );
    }

    #[test]
    fn test_strip_prefix_requires_separator() {
        let row = Row::new()
            .with("Username", "x")
            .with("User_", "y")
            .strip_prefix("User");
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["Username", "User_"]);
    }

    #[test]
    fn test_json_object() {
        let object = Row::from_pairs([("id", Value::from(2)), ("name", Value::from("Jane"))])
            .to_json_object();
        assert_eq!(object["id"], serde_json::json!(2));
        assert_eq!(object["name"], serde_json::json!("Jane"));
    }
}
