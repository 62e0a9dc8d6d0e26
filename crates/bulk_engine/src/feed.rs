//! Thin adapters that drive a session from a line-oriented reader.
//!
//! The engine itself only exposes [`BulkEngine::submit`]; these helpers are
//! the glue for callers whose input arrives as a byte stream (stdin, a
//! socket). Each line is submitted as one call, so tokens never span lines.

use std::io::BufRead;

use crate::engine::{BulkEngine, SessionId};
use crate::error::FeedError;

pub fn feed_lines<R: BufRead>(
    engine: &BulkEngine,
    id: SessionId,
    reader: R,
) -> Result<(), FeedError> {
    for line in reader.lines() {
        let line = line?;
        engine.submit(id, &line)?;
    }
    Ok(())
}

#[cfg(feature = "tokio")]
mod tokio_feed {
    use tokio::io::{AsyncBufRead, AsyncBufReadExt};

    use crate::engine::{BulkEngine, SessionId};
    use crate::error::FeedError;

    pub async fn feed_lines_async<R: AsyncBufRead + Unpin>(
        engine: &BulkEngine,
        id: SessionId,
        reader: R,
    ) -> Result<(), FeedError> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            engine.submit(id, &line)?;
        }
        Ok(())
    }

}

#[cfg(feature = "tokio")]
pub use tokio_feed::feed_lines_async;
