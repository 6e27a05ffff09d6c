//! Stream adapter
//!
//! Bridges a push-driven row source and a pull-driven consumer:
//! - `EntityStream`: the consumer side, one asynchronous request at a time
//! - `RowSink`: the producer side, rows in order then one terminal signal
//! - `drive`: pumps a `futures::Stream` of rows into a sink

mod adapter;
mod exchange;
pub mod sink;
pub mod source;
pub mod stats;

pub use adapter::{EntityStream, Next, Request};
pub use sink::RowSink;
pub use source::drive;
pub use stats::StreamStats;
