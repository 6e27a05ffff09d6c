//! Producer/consumer hand-off
//!
//! The [`Exchange`] owns the pending queue, the waiter queue and the
//! terminal state. Every method runs inside the single critical section of
//! the `parking_lot::Mutex` wrapping it, which is what keeps row arrival,
//! completion and requests atomic relative to each other.
//!
//! Invariant: at most one of `pending` and `waiters` is non-empty. An
//! arriving row goes to the earliest live waiter if there is one, and a
//! request is served from `pending` before it is ever registered as a
//! waiter.

use crate::common::error::StreamError;
use crate::config::{ConversionPolicy, StreamConfig};
use crate::entity::Converter;
use crate::stream::stats::StreamStats;
use crate::types::Row;
use std::collections::VecDeque;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// One unit of delivery to a request
#[derive(Debug)]
pub(crate) enum Slot<E> {
    Entity(E),
    /// Non-terminal failure tied to one request (row-local conversion
    /// failure or protocol misuse)
    Rejected(StreamError),
    Finished,
    Failed(StreamError),
}

impl<E> Slot<E> {
    fn is_entity(&self) -> bool {
        matches!(self, Slot::Entity(_))
    }
}

/// Outcome of a request against the exchange
pub(crate) enum Claim<E> {
    Ready(Slot<E>),
    Wait(oneshot::Receiver<Slot<E>>),
}

#[derive(Debug, Clone)]
enum Terminal {
    Open,
    Finished,
    Failed(StreamError),
}

pub(crate) struct Exchange<E> {
    pending: VecDeque<Slot<E>>,
    waiters: VecDeque<oneshot::Sender<Slot<E>>>,
    terminal: Terminal,
    consumer_gone: bool,
    /// Live `RowSink` handles
    sinks: usize,
    converter: Converter<E>,
    policy: ConversionPolicy,
    strict: bool,
    warn_threshold: Option<usize>,
    above_threshold: bool,
    stats: StreamStats,
}

impl<E> Exchange<E> {
    pub(crate) fn new(converter: Converter<E>, config: &StreamConfig) -> Self {
        Self {
            pending: VecDeque::with_capacity(config.initial_capacity),
            waiters: VecDeque::with_capacity(crate::common::DEFAULT_WAITER_CAPACITY),
            terminal: Terminal::Open,
            consumer_gone: false,
            sinks: 0,
            converter,
            policy: config.conversion_policy,
            strict: config.strict_protocol,
            warn_threshold: config.pending_warn_threshold,
            above_threshold: false,
            stats: StreamStats::default(),
        }
    }

    /// Row arrival: convert, then hand to a waiter or queue
    pub(crate) fn arrive(&mut self, row: Row) {
        if self.consumer_gone {
            self.stats.rows_discarded += 1;
            trace!("consumer dropped, discarding row");
            return;
        }
        if !matches!(self.terminal, Terminal::Open) {
            self.stats.rows_discarded += 1;
            warn!("row arrived after the stream terminated, discarding");
            return;
        }

        self.stats.rows_received += 1;
        trace!(row = self.stats.rows_received, "row arrived");

        match (self.converter)(row) {
            Ok(entity) => self.route(Slot::Entity(entity), false),
            Err(err) => {
                self.stats.conversion_failures += 1;
                match self.policy {
                    ConversionPolicy::PerRow => {
                        debug!(error = %err, "row conversion failed");
                        self.route(Slot::Rejected(StreamError::Conversion(err)), false);
                    }
                    ConversionPolicy::Fatal => {
                        debug!(error = %err, "row conversion failed, terminating stream");
                        self.terminate(Terminal::Failed(StreamError::FatalConversion(err)));
                    }
                }
            }
        }
    }

    /// Clean end of the row source
    pub(crate) fn complete(&mut self) {
        self.terminate(Terminal::Finished);
    }

    /// Abnormal end of the row source
    pub(crate) fn fail(&mut self, err: StreamError) {
        self.terminate(Terminal::Failed(err));
    }

    /// Consumer request
    pub(crate) fn claim(&mut self) -> Claim<E> {
        if let Some(slot) = self.claim_ready() {
            return Claim::Ready(slot);
        }

        // Waiters whose request future was dropped never get fulfilled
        self.waiters.retain(|waiter| !waiter.is_closed());
        if self.strict && !self.waiters.is_empty() {
            warn!(
                waiting = self.waiters.len(),
                "request issued while another is outstanding"
            );
            return Claim::Ready(Slot::Rejected(StreamError::ProtocolMisuse));
        }

        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        self.stats.waiters_registered += 1;
        trace!(waiting = self.waiters.len(), "request registered as waiter");
        Claim::Wait(rx)
    }

    /// Serve a request without registering a waiter
    pub(crate) fn claim_ready(&mut self) -> Option<Slot<E>> {
        if self.consumer_gone {
            // a request that outlived its stream; rows were discarded
            return Some(Slot::Failed(StreamError::Closed));
        }
        if let Some(slot) = self.pending.pop_front() {
            if slot.is_entity() {
                self.stats.rows_delivered += 1;
            }
            if let Some(threshold) = self.warn_threshold {
                if self.pending.len() < threshold {
                    self.above_threshold = false;
                }
            }
            return Some(slot);
        }
        self.terminal_slot()
    }

    /// Take back a slot whose request went away before reading it
    ///
    /// The slot was the earliest undelivered one when it was handed out, so
    /// it goes back to the front.
    pub(crate) fn restore(&mut self, slot: Slot<E>) {
        match slot {
            Slot::Entity(_) | Slot::Rejected(_) => {
                if self.consumer_gone {
                    return;
                }
                if slot.is_entity() {
                    self.stats.rows_delivered = self.stats.rows_delivered.saturating_sub(1);
                }
                trace!("restoring slot from abandoned request");
                self.route(slot, true);
            }
            // reproduced from the terminal state on the next request
            Slot::Finished | Slot::Failed(_) => {}
        }
    }

    /// The consumer handle was dropped; nothing queued can be delivered
    pub(crate) fn close_consumer(&mut self) {
        self.consumer_gone = true;
        self.stats.rows_discarded += self.pending.len();
        self.pending.clear();
        while let Some(waiter) = self.waiters.pop_front() {
            let _ = waiter.send(Slot::Failed(StreamError::Closed));
        }
        debug!(
            received = self.stats.rows_received,
            delivered = self.stats.rows_delivered,
            "consumer dropped"
        );
    }

    pub(crate) fn attach_sink(&mut self) {
        self.sinks += 1;
    }

    /// A `RowSink` was dropped
    ///
    /// Losing the last one while the stream is still open is an abnormal
    /// end of the row source.
    pub(crate) fn detach_sink(&mut self) {
        self.sinks = self.sinks.saturating_sub(1);
        if self.sinks > 0 || !matches!(self.terminal, Terminal::Open) {
            return;
        }
        if !self.consumer_gone {
            warn!(
                received = self.stats.rows_received,
                "every row sink dropped before the row source ended"
            );
        }
        self.terminate(Terminal::Failed(StreamError::from_source(anyhow::anyhow!(
            "row source dropped without completing"
        ))));
    }

    /// No further rows will be accepted
    pub(crate) fn is_closed(&self) -> bool {
        self.consumer_gone || !matches!(self.terminal, Terminal::Open)
    }

    /// Terminal and fully drained
    pub(crate) fn is_exhausted(&self) -> bool {
        !matches!(self.terminal, Terminal::Open) && self.pending.is_empty()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn waiting_len(&self) -> usize {
        self.waiters.iter().filter(|waiter| !waiter.is_closed()).count()
    }

    pub(crate) fn stats(&self) -> StreamStats {
        self.stats.clone()
    }

    fn terminal_slot(&self) -> Option<Slot<E>> {
        match &self.terminal {
            Terminal::Open => None,
            Terminal::Finished => Some(Slot::Finished),
            Terminal::Failed(err) => Some(Slot::Failed(err.clone())),
        }
    }

    fn terminate(&mut self, terminal: Terminal) {
        if !matches!(self.terminal, Terminal::Open) {
            warn!(
                current = ?self.terminal,
                ignored = ?terminal,
                "row source signalled termination twice"
            );
            return;
        }
        self.terminal = terminal;

        let waiting = self.waiters.len();
        while let Some(waiter) = self.waiters.pop_front() {
            if let Some(slot) = self.terminal_slot() {
                let _ = waiter.send(slot);
            }
        }

        match &self.terminal {
            Terminal::Failed(err) => debug!(
                error = %err,
                pending = self.pending.len(),
                waiting,
                "stream failed"
            ),
            _ => debug!(
                received = self.stats.rows_received,
                pending = self.pending.len(),
                waiting,
                "stream finished"
            ),
        }
    }

    /// Hand a slot to the earliest live waiter, or queue it
    fn route(&mut self, mut slot: Slot<E>, front: bool) {
        while let Some(waiter) = self.waiters.pop_front() {
            let is_entity = slot.is_entity();
            match waiter.send(slot) {
                Ok(()) => {
                    if is_entity {
                        self.stats.rows_delivered += 1;
                    }
                    return;
                }
                Err(returned) => {
                    trace!("skipping abandoned waiter");
                    slot = returned;
                }
            }
        }

        if front {
            self.pending.push_front(slot);
        } else {
            self.pending.push_back(slot);
        }

        let len = self.pending.len();
        self.stats.peak_pending = self.stats.peak_pending.max(len);
        if let Some(threshold) = self.warn_threshold {
            if len >= threshold && !self.above_threshold {
                self.above_threshold = true;
                warn!(
                    pending = len,
                    threshold, "pending queue crossed warning threshold, consumer is falling behind"
                );
            }
        }
    }
}
