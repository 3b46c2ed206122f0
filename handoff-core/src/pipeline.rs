//! Producer/consumer pipeline over a [`BoundedChannel`].
//!
//! A run wires a source, an optional transform and a fresh channel together:
//!   - the producer thread puts every source item, then exactly one [`Message::EndOfStream`]
//!   - the consumer thread gets messages, transforms and collects items, and acknowledges each one
//!   - the driver (the calling thread) joins the producer, waits for the channel to drain, then joins the consumer
//!
//! # Major Types
//! - [`Pipeline`]: one configured run; consumed by `run`, `run_with` or `try_run_with`
//! - [`PipelineState`]: the run's lifecycle, logged on each transition
//! - [`PipelineError`]: everything a run can report back to its caller
//!
//! # Error Handling
//! A transform error (or panic) does not stop the consumer from draining the
//! channel: it keeps acknowledging messages without transforming them until
//! the end marker arrives, so the producer never stays blocked on a full
//! channel. The first failure is then returned. Nothing is retried.
//!
//! # Threads
//! Both tasks are scoped threads (`producer`, `consumer`) borrowing the
//! channel, so no `Arc` or global state is involved and nothing outlives the run.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::channel::{BoundedChannel, ChannelError, Message};
use crate::config::PipelineConfig;

/// Boxed error returned by a fallible transform.
pub type TransformError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    /// Producer and consumer are both live.
    Running,
    /// Producer has finished; waiting for the consumer to acknowledge the rest.
    Draining,
    Done,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("transform failed on item {index}: {source}")]
    Transform {
        index: usize,
        #[source]
        source: TransformError,
    },
    #[error("transform panicked on item {index}: {message}")]
    TransformPanicked { index: usize, message: String },
    #[error("producer panicked: {0}")]
    ProducerPanicked(String),
    #[error("consumer panicked: {0}")]
    ConsumerPanicked(String),
    #[error("pipeline incomplete: produced {expected} items, received {received}")]
    Incomplete { expected: usize, received: usize },
}

/// A single producer/consumer run over `source`.
pub struct Pipeline<I> {
    source: I,
    config: PipelineConfig,
}

impl<I> Pipeline<I>
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send,
{
    pub fn new(source: I, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    /// Run with the identity transform.
    pub fn run(self) -> Result<Vec<I::Item>, PipelineError> {
        self.run_with(|item| item)
    }

    /// Run applying `transform` to every item. A panic in `transform` is
    /// returned as [`PipelineError::TransformPanicked`].
    pub fn run_with<U, F>(self, mut transform: F) -> Result<Vec<U>, PipelineError>
    where
        U: Send,
        F: FnMut(I::Item) -> U + Send,
    {
        self.try_run_with(move |item| Ok::<U, TransformError>(transform(item)))
    }

    /// Run applying a fallible `transform`; the first error is returned as
    /// [`PipelineError::Transform`].
    pub fn try_run_with<U, E, F>(self, transform: F) -> Result<Vec<U>, PipelineError>
    where
        U: Send,
        E: Into<TransformError>,
        F: FnMut(I::Item) -> Result<U, E> + Send,
    {
        let channel = BoundedChannel::new(self.config.capacity)?;
        let mut state = PipelineState::Init;
        info!(capacity = channel.capacity(), "Starting pipeline run");

        let source = self.source.into_iter();
        let (produced, destination) =
            thread::scope(|s| -> Result<(usize, Vec<U>), PipelineError> {
                let channel = &channel;

                let consumer = thread::Builder::new()
                    .name("consumer".into())
                    .spawn_scoped(s, move || consume(channel, transform))
                    .map_err(|source| PipelineError::Spawn {
                        role: "consumer",
                        source,
                    })?;

                let producer = match thread::Builder::new()
                    .name("producer".into())
                    .spawn_scoped(s, move || produce(channel, source))
                {
                    Ok(handle) => handle,
                    Err(source) => {
                        error!(error = %source, "Failed to spawn producer; releasing consumer");
                        channel.put(Message::EndOfStream);
                        let _ = consumer.join();
                        return Err(PipelineError::Spawn {
                            role: "producer",
                            source,
                        });
                    }
                };
                transition(&mut state, PipelineState::Running);

                let produced = producer
                    .join()
                    .map_err(|payload| PipelineError::ProducerPanicked(panic_message(&*payload)));
                transition(&mut state, PipelineState::Draining);

                channel.join();
                let consumed = consumer
                    .join()
                    .map_err(|payload| PipelineError::ConsumerPanicked(panic_message(&*payload)))?;

                Ok((produced?, consumed?))
            })
            .inspect_err(|e| error!(error = %e, "Pipeline run failed"))?;

        if destination.len() != produced {
            let e = PipelineError::Incomplete {
                expected: produced,
                received: destination.len(),
            };
            error!(error = %e, "Pipeline run failed");
            return Err(e);
        }

        transition(&mut state, PipelineState::Done);
        info!(items = destination.len(), "Pipeline run complete");
        Ok(destination)
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    debug!(from = ?state, to = ?next, "Pipeline state transition");
    *state = next;
}

/// Sends the end marker when dropped, so the consumer is released even if
/// the source iterator panics.
struct EndOfStreamGuard<'a, T>(&'a BoundedChannel<T>);

impl<T> Drop for EndOfStreamGuard<'_, T> {
    fn drop(&mut self) {
        self.0.put(Message::EndOfStream);
    }
}

fn produce<T, S>(channel: &BoundedChannel<T>, source: S) -> usize
where
    S: Iterator<Item = T>,
{
    let _end = EndOfStreamGuard(channel);
    let mut sent = 0;
    for item in source {
        channel.put(Message::Item(item));
        sent += 1;
    }
    debug!(sent, "Producer exhausted source");
    sent
}

fn consume<T, U, E, F>(
    channel: &BoundedChannel<T>,
    mut transform: F,
) -> Result<Vec<U>, PipelineError>
where
    E: Into<TransformError>,
    F: FnMut(T) -> Result<U, E>,
{
    let mut destination = Vec::new();
    let mut failure: Option<PipelineError> = None;
    let mut index = 0;

    loop {
        let item = match channel.get() {
            Message::Item(item) => item,
            Message::EndOfStream => {
                channel.task_done()?;
                break;
            }
        };

        if failure.is_none() {
            match panic::catch_unwind(AssertUnwindSafe(|| transform(item))) {
                Ok(Ok(value)) => destination.push(value),
                Ok(Err(e)) => {
                    let source: TransformError = e.into();
                    error!(index, error = %source, "Transform failed; draining remaining items");
                    failure = Some(PipelineError::Transform { index, source });
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    error!(index, %message, "Transform panicked; draining remaining items");
                    failure = Some(PipelineError::TransformPanicked { index, message });
                }
            }
        }

        index += 1;
        channel.task_done()?;
    }

    debug!(consumed = index, "Consumer observed end of stream");
    match failure {
        Some(e) => Err(e),
        None => Ok(destination),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
