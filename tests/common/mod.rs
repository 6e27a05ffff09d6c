//! Shared fixtures for integration tests

#![allow(dead_code)]

use prism_stream::{ConversionError, FromRow, Row};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestEntity {
    pub id: i32,
    pub name: String,
}

impl TestEntity {
    pub fn build(id: i32, name: &str) -> Self {
        TestEntity {
            id,
            name: name.to_string(),
        }
    }
}

impl FromRow for TestEntity {
    fn from_row(row: Row) -> Result<Self, ConversionError> {
        Ok(TestEntity {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

pub fn entity_row(id: i32, name: &str) -> Row {
    Row::new().with("id", id).with("name", name)
}

/// A row whose `id` column cannot be read as an integer
pub fn malformed_row(name: &str) -> Row {
    Row::new().with("id", "not-an-id").with("name", name)
}
