use std::io;

use thiserror::Error;

use crate::engine::SessionId;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("bulk capacity must be at least 1")]
    InvalidCapacity,
    #[error("close-block token received with no open block")]
    UnbalancedBlockClose,
}

/// Failure of a single sink during fan-out. Never propagates into the
/// accumulator; the engine logs it and keeps delivering to the other sinks.
#[derive(Debug, Error)]
#[error("sink {sink} failed: {source}")]
pub struct SinkError {
    pub sink: &'static str,
    #[source]
    pub source: io::Error,
}

impl SinkError {
    pub fn new(sink: &'static str, source: io::Error) -> Self {
        Self { sink, source }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed reading input line: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Engine(#[from] BulkError),
}
