//! Channel queues with explicit back-pressure.
//!
//! One queue backs one channel. Bounded queues reject a push when full; the
//! scheduler treats the rejection as "blocked on this channel this tick" and
//! retries on a later tick, so rejection is a signal, never an error.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use weft_ir::Value;

/// Whether a queue was created by the manager or supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueOrigin {
    /// Created by the queue manager for a send-only or internal channel.
    Internal,
    /// Supplied at construction for a receive-only boundary channel.
    UserSupplied,
}

/// Outcome of a push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushOutcome {
    /// Value enqueued.
    Accepted,
    /// Bounded queue is full; the sender should retry on a later tick.
    Full,
}

impl PushOutcome {
    /// Whether the value was enqueued.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// FIFO of pending values for exactly one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelQueue {
    values: VecDeque<Value>,
    capacity: Option<usize>,
    produced: u64,
}

impl ChannelQueue {
    /// Create a queue with no bound; pushes always succeed.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            values: VecDeque::new(),
            capacity: None,
            produced: 0,
        }
    }

    /// Create a bounded queue. A zero capacity is clamped to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            values: VecDeque::new(),
            capacity: Some(capacity.max(1)),
            produced: 0,
        }
    }

    /// Try to enqueue a value.
    pub fn push(&mut self, value: Value) -> PushOutcome {
        if self.is_full() {
            return PushOutcome::Full;
        }
        self.values.push_back(value);
        self.produced += 1;
        PushOutcome::Accepted
    }

    /// Dequeue the oldest value, if any.
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop_front()
    }

    /// The oldest value without dequeuing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Value> {
        self.values.front()
    }

    /// Number of values currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether a push would be rejected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.values.len() >= cap)
    }

    /// The declared bound, if any.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Total values ever accepted, monotonic across pops. Run conditions of
    /// the form "channel X has produced ≥ N values" read this counter.
    #[must_use]
    pub fn produced_count(&self) -> u64 {
        self.produced
    }

    /// Drop all buffered values; the produced counter is unaffected.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Drop all buffered values and restart the produced counter, as if
    /// freshly constructed.
    pub fn reset(&mut self) {
        self.values.clear();
        self.produced = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = ChannelQueue::unbounded();
        q.push(Value::u32(1));
        q.push(Value::u32(2));
        q.push(Value::u32(3));
        assert_eq!(q.pop(), Some(Value::u32(1)));
        assert_eq!(q.pop(), Some(Value::u32(2)));
        assert_eq!(q.pop(), Some(Value::u32(3)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_bounded_rejects_when_full() {
        let mut q = ChannelQueue::bounded(2);
        assert!(q.push(Value::u32(1)).is_accepted());
        assert!(q.push(Value::u32(2)).is_accepted());
        assert_eq!(q.push(Value::u32(3)), PushOutcome::Full);
        assert_eq!(q.len(), 2);

        q.pop();
        assert!(q.push(Value::u32(3)).is_accepted());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let q = ChannelQueue::bounded(0);
        assert_eq!(q.capacity(), Some(1));
    }

    #[test]
    fn test_produced_counter_monotonic() {
        let mut q = ChannelQueue::bounded(1);
        q.push(Value::Token);
        assert_eq!(q.produced_count(), 1);
        // Rejected pushes do not count.
        q.push(Value::Token);
        assert_eq!(q.produced_count(), 1);
        q.pop();
        q.push(Value::Token);
        assert_eq!(q.produced_count(), 2);
    }

    #[test]
    fn test_clear_keeps_counter_reset_drops_it() {
        let mut q = ChannelQueue::unbounded();
        q.push(Value::Token);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.produced_count(), 1);
        q.reset();
        assert_eq!(q.produced_count(), 0);
    }
}
