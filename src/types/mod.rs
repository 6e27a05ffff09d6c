//! Type system module
//!
//! This module contains the raw data the database driver emits:
//! - Value: Single typed field values
//! - Row: Ordered collections of named values, one per result record

pub mod row;
pub mod value;

// Re-export main types for convenience
pub use row::Row;
pub use value::Value;
