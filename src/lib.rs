//! prism-stream - Pull-based streaming of query results
//!
//! A database driver pushes result rows as they come off the wire; a
//! consumer wants to pull typed entities one at a time. prism-stream sits in
//! between: rows are converted as they arrive, queued without bound when the
//! consumer is slow, and handed straight to a waiting request when the
//! consumer is fast. Ordering follows the row source exactly and every
//! entity is delivered once.
//!
//! ```no_run
//! use prism_stream::{EntityStream, Next, Row, StreamConfig, StreamResult};
//!
//! # async fn run() -> StreamResult<()> {
//! let (entities, sink) = EntityStream::<Row>::typed(StreamConfig::default());
//! sink.send_row(Row::new().with("id", 1).with("name", "John"));
//! sink.complete();
//!
//! while let Next::Value(row) = entities.next().await? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```
pub mod common;
pub mod config;
pub mod entity;
pub mod stream;
pub mod types;

// Re-export common types for convenience
pub use common::{ConversionError, StreamError, StreamResult};

// Re-export configuration for convenience
pub use config::{ConversionPolicy, StreamConfig};

// Re-export conversion hooks for convenience
pub use entity::{converter, from_row_converter, json_converter, Converter, FromRow, FromValue};

// Re-export the stream adapter for convenience
pub use stream::{drive, EntityStream, Next, Request, RowSink, StreamStats};

// Re-export type system for convenience
pub use types::{Row, Value};
