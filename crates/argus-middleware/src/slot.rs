//! [`HandoffSlot`] – bounded, latest-wins hand-off between execution contexts.
//!
//! Deliberately a best-effort latest-value cell, not a reliable queue: a new
//! value replaces any unconsumed predecessor, and no backpressure ever reaches
//! the producer. This keeps the detection loop's cadence independent of the
//! network loop's cadence — freshness over completeness.

use std::sync::Arc;

use parking_lot::Mutex;

/// A single-value, latest-wins hand-off cell.
///
/// Clones are cheap and share the same underlying cell; hand one clone to the
/// producer and one to the consumer. Both operations are non-blocking: the
/// lock is held only for the duration of a pointer-sized swap.
///
/// Ordering guarantee: if [`try_consume`][Self::try_consume] returns a value,
/// it is the most recently published unconsumed one. Nothing else is promised.
pub struct HandoffSlot<T> {
    cell: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for HandoffSlot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Default for HandoffSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(None)),
        }
    }

    /// Publish `value`, replacing any unconsumed predecessor.
    ///
    /// Never blocks the producer and never fails; a displaced value is simply
    /// dropped.
    pub fn publish(&self, value: T) {
        *self.cell.lock() = Some(value);
    }

    /// Take the most recently published unconsumed value, if any.
    ///
    /// Returns immediately in both cases; a consumed value is removed from
    /// the slot, so a second call yields `None` until the next publish.
    pub fn try_consume(&self) -> Option<T> {
        self.cell.lock().take()
    }
}
