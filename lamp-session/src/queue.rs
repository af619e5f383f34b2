//! Ordered command queue with single-flight execution slot
//!
//! The queue owns the ordering guarantees of the session: commands leave in
//! FIFO order, at most one command is in flight at any time, and queued
//! brightness commands are coalesced so only the most recent target survives.
//! Execution itself lives in the session (the queue has no device access);
//! the session pairs every successful [`CommandQueue::begin_next`] with a
//! [`CommandQueue::finish`].

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::command::{CommandKind, PendingCommand};

/// Snapshot of queue occupancy, for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands waiting to execute (excludes the in-flight command).
    pub pending: usize,
    /// Whether a command is currently executing against the device.
    pub in_flight: bool,
}

#[derive(Default)]
struct QueueInner {
    pending: VecDeque<PendingCommand>,
    in_flight: Option<CommandKind>,
}

pub(crate) struct CommandQueue {
    inner: Mutex<QueueInner>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Append a command to the tail of the queue.
    ///
    /// Brightness commands supersede any queued (not in-flight) brightness
    /// command: rapid repeated adjustments keep at most one pending target.
    /// Returns how many queued commands were superseded.
    pub(crate) fn enqueue(&self, command: PendingCommand) -> usize {
        let mut inner = self.inner.lock();

        let superseded = if command.kind() == CommandKind::Brightness {
            let before = inner.pending.len();
            inner.pending.retain(|c| c.kind() != CommandKind::Brightness);
            before - inner.pending.len()
        } else {
            0
        };

        inner.pending.push_back(command);
        superseded
    }

    /// Pop the head command and mark it in flight.
    ///
    /// Returns `None` when the queue is empty or a command is already in
    /// flight; callers treat that as "nothing to do". A returned command MUST
    /// be matched by a later [`finish`](Self::finish) call.
    pub(crate) fn begin_next(&self) -> Option<PendingCommand> {
        let mut inner = self.inner.lock();

        if inner.in_flight.is_some() {
            return None;
        }

        let command = inner.pending.pop_front()?;
        inner.in_flight = Some(command.kind());
        Some(command)
    }

    /// Clear the in-flight slot after a command completed (success or
    /// failure alike).
    pub(crate) fn finish(&self) {
        self.inner.lock().in_flight = None;
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        QueueStats {
            pending: inner.pending.len(),
            in_flight: inner.in_flight.is_some(),
        }
    }
}
