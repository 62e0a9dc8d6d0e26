//! Per-session batching state machine.
//!
//! The accumulator buffers data tokens and decides when a batch is complete:
//! either the buffer reached `capacity` while no block is open, or a block
//! delimiter closed the outermost block. It never performs IO itself; a
//! completed [`Batch`] is handed back to the caller, which fans it out to the
//! sinks. Keeping the state machine IO-free is what makes the flush policy
//! testable in isolation.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::SessionId;
use crate::error::BulkError;
use crate::token::{classify, TokenKind};

/// An ordered group of commands emitted together, tagged with the session it
/// came from and the arrival time of its first command.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub session: SessionId,
    pub commands: Vec<String>,
    pub started_at: SystemTime,
}

impl Batch {
    /// Seconds since the Unix epoch of the first buffered command, as used in
    /// the log-file name.
    pub fn epoch_secs(&self) -> u64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub(crate) struct Accumulator {
    session: SessionId,
    capacity: usize,
    block_depth: usize,
    commands: Vec<String>,
    started_at: Option<SystemTime>,
}

impl Accumulator {
    pub(crate) fn new(session: SessionId, capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        Self {
            session,
            capacity,
            block_depth: 0,
            commands: Vec::new(),
            started_at: None,
        }
    }

    pub(crate) fn block_depth(&self) -> usize {
        self.block_depth
    }

    pub(crate) fn buffered(&self) -> usize {
        self.commands.len()
    }

    /// Apply one token, returning the batch it completed, if any.
    ///
    /// Block markers adjust the depth and are never buffered as data. A
    /// close at depth zero is rejected without touching the buffer or the
    /// depth, so the session remains usable afterwards.
    pub(crate) fn apply(&mut self, token: &str) -> Result<Option<Batch>, BulkError> {
        match classify(token) {
            TokenKind::OpenBlock => {
                self.block_depth += 1;
                if self.block_depth == 1 {
                    return Ok(self.take_batch());
                }
                Ok(None)
            }
            TokenKind::CloseBlock => {
                if self.block_depth == 0 {
                    return Err(BulkError::UnbalancedBlockClose);
                }
                self.block_depth -= 1;
                if self.block_depth == 0 {
                    return Ok(self.take_batch());
                }
                Ok(None)
            }
            TokenKind::Data => {
                self.push(token);
                if self.block_depth == 0 && self.commands.len() == self.capacity {
                    return Ok(self.take_batch());
                }
                Ok(None)
            }
        }
    }

    /// Close policy: the pending partial batch is emitted only when no block
    /// is open; an unterminated block's buffer is discarded by the caller.
    pub(crate) fn finish(&mut self) -> Option<Batch> {
        if self.block_depth == 0 {
            self.take_batch()
        } else {
            None
        }
    }

    fn push(&mut self, token: &str) {
        if self.commands.is_empty() {
            self.started_at = Some(SystemTime::now());
        }
        self.commands.push(token.to_string());
    }

    fn take_batch(&mut self) -> Option<Batch> {
        if self.commands.is_empty() {
            return None;
        }
        let started_at = self.started_at.take().unwrap_or_else(SystemTime::now);
        Some(Batch {
            session: self.session,
            commands: std::mem::take(&mut self.commands),
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(capacity: usize) -> Accumulator {
        Accumulator::new(SessionId::new(1), capacity)
    }

    fn apply_all(acc: &mut Accumulator, tokens: &[&str]) -> Vec<Vec<String>> {
        let mut batches = Vec::new();
        for tok in tokens {
            if let Some(batch) = acc.apply(tok).unwrap() {
                batches.push(batch.commands);
            }
        }
        batches
    }

    #[test]
    fn size_trigger_flushes_exactly_every_capacity_tokens() {
        let mut acc = acc(3);
        let batches = apply_all(&mut acc, &["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(batches, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
        assert_eq!(acc.buffered(), 1);
    }

    #[test]
    fn finish_emits_shorter_final_batch() {
        let mut acc = acc(3);
        apply_all(&mut acc, &["a", "b", "c", "d"]);
        let last = acc.finish().unwrap();
        assert_eq!(last.commands, vec!["d"]);
        assert!(acc.finish().is_none());
    }

    #[test]
    fn open_block_flushes_in_progress_batch() {
        let mut acc = acc(10);
        let batches = apply_all(&mut acc, &["a", "b", "{", "c"]);
        assert_eq!(batches, vec![vec!["a", "b"]]);
        assert_eq!(acc.block_depth(), 1);
        assert_eq!(acc.buffered(), 1);
    }

    #[test]
    fn block_overrides_capacity() {
        let mut acc = acc(2);
        let batches = apply_all(&mut acc, &["{", "a", "b", "c", "d", "}"]);
        assert_eq!(batches, vec![vec!["a", "b", "c", "d"]]);
    }

    #[test]
    fn nested_blocks_flush_only_on_outermost_transitions() {
        let mut acc = acc(2);
        let batches = apply_all(&mut acc, &["{", "a", "{", "b", "}", "c", "}"]);
        assert_eq!(batches, vec![vec!["a", "b", "c"]]);
        assert_eq!(acc.block_depth(), 0);
    }

    #[test]
    fn block_markers_are_not_buffered() {
        let mut acc = acc(10);
        apply_all(&mut acc, &["{", "a", "}"]);
        assert_eq!(acc.buffered(), 0);
    }

    #[test]
    fn unbalanced_close_is_an_error_and_leaves_state_alone() {
        let mut acc = acc(3);
        apply_all(&mut acc, &["a"]);
        let err = acc.apply("}").unwrap_err();
        assert!(matches!(err, BulkError::UnbalancedBlockClose));
        assert_eq!(acc.buffered(), 1);
        assert_eq!(acc.block_depth(), 0);
        // Still usable afterwards.
        let batches = apply_all(&mut acc, &["b", "c"]);
        assert_eq!(batches, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn finish_discards_nothing_but_emits_nothing_inside_open_block() {
        let mut acc = acc(3);
        apply_all(&mut acc, &["{", "a", "b"]);
        assert!(acc.finish().is_none());
    }

    #[test]
    fn started_at_is_captured_on_first_command_of_each_batch() {
        let mut acc = acc(2);
        let before = SystemTime::now();
        let mut batches = Vec::new();
        for tok in ["a", "b"] {
            if let Some(b) = acc.apply(tok).unwrap() {
                batches.push(b);
            }
        }
        let after = SystemTime::now();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].started_at >= before && batches[0].started_at <= after);
    }

    #[test]
    fn empty_finish_is_a_no_op() {
        let mut acc = acc(3);
        assert!(acc.finish().is_none());
    }
}
