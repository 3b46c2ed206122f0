//! Bounded FIFO handoff between exactly one producer and one consumer.
//!
//! [`BoundedChannel`] is a mutex-guarded ring of [`Message`]s with three
//! condition variables:
//!   - `not_full`: producers wait here while occupancy == capacity
//!   - `not_empty`: consumers wait here while occupancy == 0
//!   - `all_done`: [`BoundedChannel::join`] waits here until every put message has been acknowledged
//!
//! End of stream is an ordinary message ([`Message::EndOfStream`]) so it is
//! delivered in FIFO order after every real item and can never collide with
//! a data value.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::trace;

/// A unit of transfer over a [`BoundedChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    Item(T),
    /// No further items will be produced.
    EndOfStream,
}

impl<T> Message<T> {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Message::EndOfStream)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
    #[error("task_done called more times than messages were put")]
    TaskDoneOverflow,
}

struct State<T> {
    buffer: VecDeque<Message<T>>,
    /// Messages put but not yet acknowledged with `task_done`.
    unfinished: usize,
}

/// Fixed-capacity blocking FIFO.
pub struct BoundedChannel<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    all_done: Condvar,
}

impl<T> BoundedChannel<T> {
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity),
                unfinished: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            all_done: Condvar::new(),
        })
    }

    /// Append `message`, blocking while the channel is full.
    pub fn put(&self, message: Message<T>) {
        let mut state = self.lock();
        while state.buffer.len() == self.capacity {
            trace!(capacity = self.capacity, "put blocked: channel full");
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let end = message.is_end_of_stream();
        state.buffer.push_back(message);
        state.unfinished += 1;
        trace!(
            occupancy = state.buffer.len(),
            end_of_stream = end,
            "message put"
        );
        drop(state);
        self.not_empty.notify_one();
    }

    /// Remove and return the oldest message, blocking while the channel is empty.
    pub fn get(&self) -> Message<T> {
        let mut state = self.lock();
        let message = loop {
            if let Some(message) = state.buffer.pop_front() {
                break message;
            }
            trace!("get blocked: channel empty");
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        };
        trace!(occupancy = state.buffer.len(), "message taken");
        drop(state);
        self.not_full.notify_one();
        message
    }

    /// Acknowledge one message previously returned by [`get`](Self::get).
    pub fn task_done(&self) -> Result<(), ChannelError> {
        let mut state = self.lock();
        if state.unfinished == 0 {
            return Err(ChannelError::TaskDoneOverflow);
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
        Ok(())
    }

    /// Block until every message put so far has been acknowledged.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current occupancy. A snapshot: it may change as soon as the lock is released.
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }

    // No caller code runs while the lock is held, so a poisoned lock still
    // guards a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
