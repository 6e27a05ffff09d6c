//! Stream statistics

use serde::{Deserialize, Serialize};

/// Counters kept by the exchange, read through `EntityStream::stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Rows accepted from the row source
    pub rows_received: usize,
    /// Entities handed to the consumer
    pub rows_delivered: usize,
    /// Rows dropped because the stream had terminated or the consumer was gone
    pub rows_discarded: usize,
    /// Rows the conversion hook rejected
    pub conversion_failures: usize,
    /// Requests that had to wait for a row or for completion
    pub waiters_registered: usize,
    /// Largest pending queue length observed
    pub peak_pending: usize,
}
