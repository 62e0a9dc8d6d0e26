//! Batch destinations.
//!
//! Every completed batch is fanned out to each registered sink in a fixed
//! order. Sinks are independent: one failing does not stop the others, and
//! sink errors never reach the batching state machine.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::accumulator::Batch;
use crate::error::SinkError;

pub trait BatchSink: Send + Sync {
    fn name(&self) -> &'static str;
    fn accept(&self, batch: &Batch) -> Result<(), SinkError>;
}

/// Serialized body shared by all sinks: `bulk: ` marker, then each command
/// followed by a single space (the trailing space is part of the format).
pub fn render_line(batch: &Batch) -> String {
    let mut line = String::from("bulk: ");
    for cmd in &batch.commands {
        line.push_str(cmd);
        line.push(' ');
    }
    line
}

/// Writes each batch as one line to process stdout. The internal mutex keeps
/// concurrent flushes from different sessions from interleaving mid-line.
#[derive(Default)]
pub struct ConsoleSink {
    stdout: Mutex<()>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn accept(&self, batch: &Batch) -> Result<(), SinkError> {
        let line = render_line(batch);
        let _guard = self.stdout.lock();
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush())
            .map_err(|err| SinkError::new(self.name(), err))
    }
}

/// Creates one `bulk-<session>-<epoch-seconds>.log` file per flush. The
/// session suffix is a monotonic per-session identifier, so file names never
/// collide across sessions within one process.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BatchSink for FileSink {
    fn name(&self) -> &'static str {
        "log-file"
    }

    fn accept(&self, batch: &Batch) -> Result<(), SinkError> {
        let name = format!("bulk-{}-{}.log", batch.session, batch.epoch_secs());
        let path = self.dir.join(name);
        File::create(&path)
            .and_then(|mut file| file.write_all(render_line(batch).as_bytes()))
            .map_err(|err| SinkError::new(self.name(), err))
    }
}
