//! Streaming buffer contract shared by all blocks
//!
//! The blocks in this crate are driven by an external pull-based scheduler.
//! The scheduler owns every buffer; a block is handed read-only input slices
//! and a mutable output slice, does as much work as the buffers allow, and
//! reports back exactly how many items it consumed per input stream and how
//! many it produced. Partial progress within one call is committed — there
//! is no rollback and no cancellation mid-call.
//!
//! Each block also answers a forecast question before invocation: given a
//! desired output count, how many input items are required to guarantee that
//! production is possible. For 1:1 blocks the answer is trivial; for blocks
//! that produce without consuming (pilot substitution) the forecast is an
//! upper bound.
//!
//! A block that cannot make progress with the buffers it was given consumes
//! and produces nothing; the scheduler retries once more capacity exists.

/// Outcome of one `work` call: items consumed per input stream and items
/// produced on the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    /// Items consumed, one entry per input stream.
    pub consumed: Vec<usize>,
    /// Items produced on the output stream.
    pub produced: usize,
}

impl WorkResult {
    /// Result for a block with a single input stream.
    pub fn single(consumed: usize, produced: usize) -> Self {
        Self {
            consumed: vec![consumed],
            produced,
        }
    }

    /// No progress was possible with the buffers provided; the caller
    /// should retry once more input or output capacity exists.
    pub fn stalled(num_input_streams: usize) -> Self {
        Self {
            consumed: vec![0; num_input_streams],
            produced: 0,
        }
    }

    /// True if this call made no forward progress.
    pub fn is_stalled(&self) -> bool {
        self.produced == 0 && self.consumed.iter().all(|&n| n == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stream_result() {
        let r = WorkResult::single(24, 24);
        assert_eq!(r.consumed, vec![24]);
        assert_eq!(r.produced, 24);
        assert!(!r.is_stalled());
    }

    #[test]
    fn test_stalled() {
        let r = WorkResult::stalled(2);
        assert_eq!(r.consumed, vec![0, 0]);
        assert!(r.is_stalled());

        // Producing without consuming is still progress
        let r = WorkResult::single(0, 1);
        assert!(!r.is_stalled());
    }
}
