//! Constants used throughout prism-stream

/// Default pre-allocated capacity of the pending entity queue
pub const DEFAULT_PENDING_CAPACITY: usize = 64;

/// Default pre-allocated capacity of the waiter queue (one consumer)
pub const DEFAULT_WAITER_CAPACITY: usize = 1;

/// Upper bound on pre-allocation requested through configuration
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20; // 1M entities

/// Separator between a table alias and a column name (`Entity_field`)
pub const ALIAS_SEPARATOR: char = '_';
