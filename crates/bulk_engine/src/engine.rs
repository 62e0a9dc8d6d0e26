//! Session registry and sink fan-out.
//!
//! The engine owns one accumulator per live session plus the shared sink
//! list. The registry mutex covers only map insert/lookup/remove; per-session
//! work runs under the session's own mutex with the registry lock released,
//! so independent sessions never contend with each other.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::accumulator::{Accumulator, Batch};
use crate::error::BulkError;
use crate::sink::{BatchSink, ConsoleSink, FileSink};
use crate::token::tokenize;

/// Opaque handle to one command stream. Allocated from a process-wide
/// counter, never reused, invalid after [`BulkEngine::close_session`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

type SharedSession = Arc<Mutex<Accumulator>>;

#[derive(Default)]
pub struct BulkEngineBuilder {
    console: bool,
    log_dir: Option<PathBuf>,
    extra_sinks: Vec<Arc<dyn BatchSink>>,
}

impl BulkEngineBuilder {
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn sink(mut self, sink: Arc<dyn BatchSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// Fan-out order is fixed: console, then log files, then extra sinks in
    /// registration order.
    pub fn build(self) -> BulkEngine {
        let mut sinks: Vec<Arc<dyn BatchSink>> = Vec::new();
        if self.console {
            sinks.push(Arc::new(ConsoleSink::new()));
        }
        if let Some(dir) = self.log_dir {
            sinks.push(Arc::new(FileSink::new(dir)));
        }
        sinks.extend(self.extra_sinks);

        BulkEngine {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            sinks,
        }
    }
}

pub struct BulkEngine {
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
    next_id: AtomicU64,
    sinks: Vec<Arc<dyn BatchSink>>,
}

impl BulkEngine {
    /// Empty builder: no sinks until configured.
    pub fn builder() -> BulkEngineBuilder {
        BulkEngineBuilder::default()
    }

    /// Standard configuration: console sink plus per-flush log files in the
    /// current directory.
    pub fn new() -> Self {
        Self::builder().console(true).log_dir(".").build()
    }

    pub fn create_session(&self, capacity: usize) -> Result<SessionId, BulkError> {
        if capacity == 0 {
            return Err(BulkError::InvalidCapacity);
        }
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(Mutex::new(Accumulator::new(id, capacity)));
        self.sessions.lock().insert(id, session);
        debug!(session = %id, capacity, "session created");
        Ok(id)
    }

    /// Tokenizes `text` and applies each token to the session in order,
    /// delivering completed batches to the sinks as they are produced.
    ///
    /// An unbalanced close-block token aborts the remaining tokens of this
    /// call and is returned; the session's buffered commands and block depth
    /// are untouched and the session stays usable.
    pub fn submit(&self, id: SessionId, text: &str) -> Result<(), BulkError> {
        let session = self.lookup(id)?;
        let mut acc = session.lock();
        for token in tokenize(text) {
            if let Some(batch) = acc.apply(token)? {
                self.deliver(&batch);
            }
        }
        Ok(())
    }

    /// Removes the session. A pending partial batch is flushed only when no
    /// block is open; an unterminated block's buffer is discarded.
    pub fn close_session(&self, id: SessionId) -> Result<(), BulkError> {
        let session = self
            .sessions
            .lock()
            .remove(&id)
            .ok_or(BulkError::UnknownSession(id))?;
        self.finish_session(id, &session);
        Ok(())
    }

    /// Closes every remaining session with the normal close policy.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        let drained: Vec<(SessionId, SharedSession)> =
            self.sessions.lock().drain().collect();
        for (id, session) in drained {
            self.finish_session(id, &session);
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    fn lookup(&self, id: SessionId) -> Result<SharedSession, BulkError> {
        self.sessions
            .lock()
            .get(&id)
            .cloned()
            .ok_or(BulkError::UnknownSession(id))
    }

    fn finish_session(&self, id: SessionId, session: &SharedSession) {
        let mut acc = session.lock();
        if let Some(batch) = acc.finish() {
            self.deliver(&batch);
        } else if acc.buffered() > 0 {
            warn!(
                session = %id,
                discarded = acc.buffered(),
                block_depth = acc.block_depth(),
                "session closed inside an open block; buffered commands discarded"
            );
        }
        debug!(session = %id, "session closed");
    }

    fn deliver(&self, batch: &Batch) {
        debug!(
            session = %batch.session,
            commands = batch.commands.len(),
            "delivering batch"
        );
        for sink in &self.sinks {
            if let Err(err) = sink.accept(batch) {
                warn!(session = %batch.session, error = %err, "sink failed");
            }
        }
    }
}

impl Default for BulkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BulkEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
