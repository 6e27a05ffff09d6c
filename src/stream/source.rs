//! Driving a row source into a sink
//!
//! Database drivers usually expose a result set as a `futures::Stream` of
//! rows. [`drive`] pumps such a stream into a [`RowSink`] and turns its end
//! into exactly one completion or failure signal.

use super::adapter::EntityStream;
use super::sink::RowSink;
use crate::config::StreamConfig;
use crate::entity::Converter;
use crate::types::Row;
use futures::{Stream, StreamExt};
use tracing::debug;

/// Forward every row of `source` into `sink`
///
/// Completes the sink when the source is exhausted and fails it on the
/// first source error. Stops polling early once the sink is closed (the
/// consumer went away or a fatal conversion error ended the stream).
/// Returns the number of rows forwarded.
pub async fn drive<S, Err, E>(source: S, sink: RowSink<E>) -> usize
where
    S: Stream<Item = Result<Row, Err>>,
    Err: Into<anyhow::Error>,
{
    futures::pin_mut!(source);
    let mut forwarded = 0;

    loop {
        if sink.is_closed() {
            debug!(forwarded, "sink closed, abandoning row source");
            return forwarded;
        }
        match source.next().await {
            Some(Ok(row)) => {
                forwarded += 1;
                sink.send_row(row);
            }
            Some(Err(err)) => {
                let err: anyhow::Error = err.into();
                debug!(forwarded, error = %err, "row source failed");
                sink.fail(err);
                return forwarded;
            }
            None => {
                debug!(forwarded, "row source exhausted");
                sink.complete();
                return forwarded;
            }
        }
    }
}

impl<E: Send + 'static> EntityStream<E> {
    /// Bind a stream to a row source driven on a background tokio task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, Err>(source: S, converter: Converter<E>, config: StreamConfig) -> Self
    where
        S: Stream<Item = Result<Row, Err>> + Send + 'static,
        Err: Into<anyhow::Error> + Send + 'static,
    {
        let (stream, sink) = Self::channel(converter, config);
        tokio::spawn(drive(source, sink));
        stream
    }
}
