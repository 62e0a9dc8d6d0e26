#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use bulk_engine::{Batch, BatchSink, SinkError};
use parking_lot::Mutex;

/// Test sink that records every delivered batch.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Batch>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.batches.lock().clone()
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .iter()
            .map(|b| b.commands.clone())
            .collect()
    }
}

impl BatchSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn accept(&self, batch: &Batch) -> Result<(), SinkError> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

/// Test sink that always fails.
pub struct FailingSink;

impl BatchSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn accept(&self, _batch: &Batch) -> Result<(), SinkError> {
        Err(SinkError::new(
            self.name(),
            io::Error::new(io::ErrorKind::Other, "always fails"),
        ))
    }
}
