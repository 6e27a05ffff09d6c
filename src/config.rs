//! Stream configuration
//!
//! Settings can be built in code or loaded from a JSON document. Every field
//! has a default, so a partial document only overrides what it names.

use crate::common::constants::{DEFAULT_PENDING_CAPACITY, MAX_INITIAL_CAPACITY};
use crate::common::error::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a conversion failure does to the rest of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPolicy {
    /// The failing row's slot carries the error and the stream ends in the
    /// error-terminal state
    #[default]
    Fatal,
    /// The failing row's slot carries the error; later rows keep flowing
    PerRow,
}

/// Stream adapter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// How conversion failures propagate
    pub conversion_policy: ConversionPolicy,
    /// Report a second concurrent waiting request as protocol misuse
    ///
    /// With this off, concurrent requests are served FIFO, but a fulfilled
    /// request dropped before it is polled puts its entity back at the
    /// front of the queue, behind entities a later request already took.
    /// Order is then only guaranteed for one outstanding request at a time.
    pub strict_protocol: bool,
    /// Pre-allocated capacity of the pending queue
    pub initial_capacity: usize,
    /// Pending queue length at which a warning is logged (no backpressure)
    pub pending_warn_threshold: Option<usize>,
}

impl StreamConfig {
    /// Configuration that keeps streaming past unconvertible rows
    pub fn per_row() -> Self {
        Self {
            conversion_policy: ConversionPolicy::PerRow,
            ..Default::default()
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> StreamResult<Self> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> StreamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> StreamResult<()> {
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(StreamError::Config(format!(
                "initial_capacity {} exceeds maximum of {}",
                self.initial_capacity, MAX_INITIAL_CAPACITY
            )));
        }
        if self.pending_warn_threshold == Some(0) {
            return Err(StreamError::Config(
                "pending_warn_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            conversion_policy: ConversionPolicy::Fatal,
            strict_protocol: true,
            initial_capacity: DEFAULT_PENDING_CAPACITY,
            pending_warn_threshold: None,
        }
    }
}
