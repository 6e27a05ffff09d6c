//! Consumer-facing stream surface
//!
//! [`EntityStream`] is the pull side of the adapter. Each call to
//! [`EntityStream::next`] returns a [`Request`] future that resolves to the
//! next entity, to [`Next::Finished`] once the row source has ended and the
//! queue is drained, or to an error. The same protocol is also available as
//! a [`futures::Stream`].

use super::exchange::{Claim, Exchange, Slot};
use super::sink::RowSink;
use super::stats::StreamStats;
use crate::common::error::StreamResult;
use crate::config::StreamConfig;
use crate::entity::{from_row_converter, Converter, FromRow};
use crate::internal_err;
use futures::stream::{FusedStream, Stream};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;

pub(crate) type Shared<E> = Arc<Mutex<Exchange<E>>>;

/// Result of a successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next<T> {
    /// The next entity in row order
    Value(T),
    /// The row source ended cleanly and every entity has been delivered
    Finished,
}

impl<T> Next<T> {
    pub fn is_finished(&self) -> bool {
        matches!(self, Next::Finished)
    }

    /// The entity, or `None` once finished
    pub fn value(self) -> Option<T> {
        match self {
            Next::Value(value) => Some(value),
            Next::Finished => None,
        }
    }

    pub fn as_ref(&self) -> Next<&T> {
        match self {
            Next::Value(value) => Next::Value(value),
            Next::Finished => Next::Finished,
        }
    }
}

impl<E> Slot<E> {
    fn into_result(self) -> StreamResult<Next<E>> {
        match self {
            Slot::Entity(entity) => Ok(Next::Value(entity)),
            Slot::Finished => Ok(Next::Finished),
            Slot::Rejected(err) | Slot::Failed(err) => Err(err),
        }
    }
}

/// Pull-based stream of converted entities
///
/// Created together with the [`RowSink`] its row source pushes into. Only
/// one request should be outstanding at a time; with `strict_protocol`
/// enabled a second concurrent waiting request fails with
/// `StreamError::ProtocolMisuse` and leaves the first one untouched.
///
/// Dropping the stream discards everything still queued and closes the
/// sink. Requests that outlive it resolve to `StreamError::Closed`.
pub struct EntityStream<E> {
    shared: Shared<E>,
    in_flight: Option<Request<E>>,
    fused: bool,
}

impl<E> EntityStream<E> {
    /// Create a stream and the sink its row source feeds
    pub fn channel(converter: Converter<E>, config: StreamConfig) -> (Self, RowSink<E>) {
        let shared = Arc::new(Mutex::new(Exchange::new(converter, &config)));
        let stream = EntityStream {
            shared: shared.clone(),
            in_flight: None,
            fused: false,
        };
        (stream, RowSink::new(shared))
    }

    /// Request the next entity
    ///
    /// Resolves immediately when an entity is queued or the stream has
    /// ended; otherwise waits for the next row arrival or termination. If
    /// the returned future is dropped after it was fulfilled but before it
    /// was polled, its entity goes back to the front of the queue.
    pub fn next(&self) -> Request<E> {
        Request::new(self.shared.clone())
    }

    /// Request the next entity without waiting
    ///
    /// Returns `None` when the request would have to wait for the row
    /// source.
    pub fn try_next(&self) -> Option<StreamResult<Next<E>>> {
        self.shared.lock().claim_ready().map(Slot::into_result)
    }

    /// Drain the stream into a vector, stopping at the first error
    pub async fn collect_all(&self) -> StreamResult<Vec<E>> {
        let mut entities = Vec::new();
        while let Next::Value(entity) = self.next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }

    /// The row source has ended and every queued entity was delivered
    pub fn is_exhausted(&self) -> bool {
        self.shared.lock().is_exhausted()
    }

    /// Entities received but not yet requested
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending_len()
    }

    pub fn stats(&self) -> StreamStats {
        self.shared.lock().stats()
    }
}

impl<E: FromRow + 'static> EntityStream<E> {
    /// Create a stream that converts rows with `E::from_row`
    pub fn typed(config: StreamConfig) -> (Self, RowSink<E>) {
        Self::channel(from_row_converter::<E>(), config)
    }
}

impl<E> Drop for EntityStream<E> {
    fn drop(&mut self) {
        self.shared.lock().close_consumer();
    }
}

impl<E> std::fmt::Debug for EntityStream<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let exchange = self.shared.lock();
        f.debug_struct("EntityStream")
            .field("pending", &exchange.pending_len())
            .field("waiting", &exchange.waiting_len())
            .field("exhausted", &exchange.is_exhausted())
            .finish()
    }
}

impl<E> Stream for EntityStream<E> {
    type Item = StreamResult<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.fused {
            return Poll::Ready(None);
        }

        let request = this
            .in_flight
            .get_or_insert_with(|| Request::new(this.shared.clone()));
        let slot = ready!(request.poll_slot(cx));
        this.in_flight = None;

        match slot {
            Slot::Entity(entity) => Poll::Ready(Some(Ok(entity))),
            Slot::Rejected(err) => Poll::Ready(Some(Err(err))),
            Slot::Finished => {
                this.fused = true;
                Poll::Ready(None)
            }
            Slot::Failed(err) => {
                this.fused = true;
                Poll::Ready(Some(Err(err)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.fused {
            return (0, Some(0));
        }
        (self.shared.lock().pending_len(), None)
    }
}

impl<E> FusedStream for EntityStream<E> {
    fn is_terminated(&self) -> bool {
        self.fused
    }
}

enum RequestState<E> {
    Idle,
    Waiting(oneshot::Receiver<Slot<E>>),
    Done,
}

/// Future returned by [`EntityStream::next`]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Request<E> {
    shared: Shared<E>,
    state: RequestState<E>,
}

impl<E> Unpin for Request<E> {}

impl<E> Request<E> {
    fn new(shared: Shared<E>) -> Self {
        Request {
            shared,
            state: RequestState::Idle,
        }
    }

    fn poll_slot(&mut self, cx: &mut Context<'_>) -> Poll<Slot<E>> {
        loop {
            match &mut self.state {
                RequestState::Idle => {
                    let claim = self.shared.lock().claim();
                    match claim {
                        Claim::Ready(slot) => {
                            self.state = RequestState::Done;
                            return Poll::Ready(slot);
                        }
                        Claim::Wait(rx) => self.state = RequestState::Waiting(rx),
                    }
                }
                RequestState::Waiting(rx) => {
                    let slot = ready!(Pin::new(rx).poll(cx)).unwrap_or_else(|_| {
                        Slot::Failed(internal_err!("waiter released without a result"))
                    });
                    self.state = RequestState::Done;
                    return Poll::Ready(slot);
                }
                RequestState::Done => {
                    return Poll::Ready(Slot::Failed(internal_err!(
                        "request polled after completion"
                    )))
                }
            }
        }
    }
}

impl<E> Future for Request<E> {
    type Output = StreamResult<Next<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().poll_slot(cx).map(Slot::into_result)
    }
}

impl<E> Drop for Request<E> {
    fn drop(&mut self) {
        if let RequestState::Waiting(rx) = &mut self.state {
            rx.close();
            // fulfilled between the last poll and now
            if let Ok(slot) = rx.try_recv() {
                self.shared.lock().restore(slot);
            }
        }
    }
}
