//! Error handling for prism-stream

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A row could not be mapped onto the target entity shape
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    /// Column that failed to convert, when known
    pub column: Option<String>,
    pub message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            column: None,
            message: message.into(),
        }
    }

    pub fn for_column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            message: message.into(),
        }
    }

    pub fn missing_column(column: &str) -> Self {
        Self::for_column(column, "column not present in row")
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "column '{}': {}", column, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConversionError {}

/// Main error type for stream operations
///
/// Errors are cloned when a terminal failure has to be handed to every
/// outstanding and future request, so the non-clonable payloads are kept
/// behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// A row could not be converted; later rows keep flowing
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// A row could not be converted and the stream ended with it
    #[error("Conversion error, stream terminated: {0}")]
    FatalConversion(ConversionError),

    #[error("Source error: {0}")]
    Source(Arc<anyhow::Error>),

    #[error("Protocol misuse: a request is already outstanding on this stream")]
    ProtocolMisuse,

    /// The consumer handle was dropped and undelivered rows were discarded
    #[error("Stream closed: its consumer was dropped")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Wrap an arbitrary driver error as an abnormal end of the row source
    pub fn from_source(err: impl Into<anyhow::Error>) -> Self {
        StreamError::Source(Arc::new(err.into()))
    }

    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            StreamError::Conversion(_) | StreamError::FatalConversion(_)
        )
    }

    /// The conversion failure carried by this error, fatal or not
    pub fn conversion_error(&self) -> Option<&ConversionError> {
        match self {
            StreamError::Conversion(err) | StreamError::FatalConversion(err) => Some(err),
            _ => None,
        }
    }

    /// No further entity will follow this error
    ///
    /// Only a per-row conversion failure and protocol misuse leave the
    /// stream usable.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            StreamError::Conversion(_) | StreamError::ProtocolMisuse
        )
    }

    pub fn is_source(&self) -> bool {
        matches!(self, StreamError::Source(_))
    }

    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, StreamError::ProtocolMisuse)
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Config(err.to_string())
    }
}

/// Result type alias for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Macro for creating conversion errors
#[macro_export]
macro_rules! conversion_err {
    ($msg:expr) => {
        $crate::common::error::ConversionError::new($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::ConversionError::new(format!($fmt, $($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::StreamError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::StreamError::Internal(format!($fmt, $($arg)*))
    };
}
