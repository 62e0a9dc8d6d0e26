#![forbid(unsafe_code)]
//! Session-oriented command batching.
//!
//! Clients open a session, stream whitespace-separated command tokens into
//! it, and the engine groups them into bulks delivered to every configured
//! sink. Batching is size-driven by default; tokens containing `{` / `}`
//! open and close nested blocks during which size triggers are suspended and
//! the whole block is emitted as one bulk.
//!
//! Commands are opaque: the engine never interprets them. Delivery is
//! at-most-once per sink; nothing is persisted across restarts.

mod accumulator;
mod engine;
mod error;
mod feed;
mod sink;
mod token;

pub use accumulator::Batch;
pub use engine::{BulkEngine, BulkEngineBuilder, SessionId};
pub use error::{BulkError, FeedError, SinkError};
pub use feed::feed_lines;
pub use sink::{render_line, BatchSink, ConsoleSink, FileSink};

#[cfg(feature = "tokio")]
pub use feed::feed_lines_async;
