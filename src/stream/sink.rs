//! Producer-facing handle
//!
//! A [`RowSink`] is what a row source talks to: one call per row, then
//! exactly one of [`RowSink::complete`] or [`RowSink::fail`]. Calls may come
//! from any thread; each one is applied atomically to the shared exchange.
//! Dropping the last handle without either call fails the stream.

use super::adapter::Shared;
use crate::common::error::StreamError;
use crate::types::Row;

/// Push side of an [`EntityStream`](super::EntityStream)
pub struct RowSink<E> {
    shared: Shared<E>,
}

impl<E> RowSink<E> {
    pub(crate) fn new(shared: Shared<E>) -> Self {
        shared.lock().attach_sink();
        Self { shared }
    }

    /// Deliver one row, in source order
    ///
    /// Rows sent after termination or after the consumer went away are
    /// discarded.
    pub fn send_row(&self, row: Row) {
        self.shared.lock().arrive(row);
    }

    /// Signal a clean end of the result set
    pub fn complete(&self) {
        self.shared.lock().complete();
    }

    /// Signal an abnormal end of the result set (e.g. a dropped connection)
    pub fn fail(&self, err: impl Into<anyhow::Error>) {
        self.shared.lock().fail(StreamError::from_source(err));
    }

    /// The stream accepts no more rows: it has terminated or its consumer
    /// was dropped
    pub fn is_closed(&self) -> bool {
        self.shared.lock().is_closed()
    }
}

impl<E> Clone for RowSink<E> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<E> Drop for RowSink<E> {
    fn drop(&mut self) {
        self.shared.lock().detach_sink();
    }
}

impl<E> std::fmt::Debug for RowSink<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSink")
            .field("closed", &self.is_closed())
            .finish()
    }
}
