//! WaveError: Unified error type for wave-halo public APIs
//!
//! Every fallible operation in the crate (partitioning, halo exchange,
//! gather, broadcast, group bootstrap) reports through this type. Configuration
//! errors are detected before any message is posted, so all members of a group
//! fail the same way instead of leaving a peer blocked.

use thiserror::Error;

/// Unified error type for wave-halo operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveError {
    /// The field needs two boundary points plus at least one interior point.
    #[error("field of {i_max} points is too small (need at least 3)")]
    FieldTooSmall { i_max: usize },
    /// One of the three role buffers disagrees with the others in length.
    #[error("buffer `{role}` has length {got}, expected {expected}")]
    BufferLengthMismatch {
        role: &'static str,
        expected: usize,
        got: usize,
    },
    /// A process group must have at least one member.
    #[error("process group is empty")]
    EmptyGroup,
    /// More workers than interior points: some would own an empty range.
    #[error("{workers} workers cannot share {interior} interior points")]
    TooManyWorkers { workers: usize, interior: usize },
    /// Rank outside `[0, size)`.
    #[error("rank {rank} is outside a group of size {size}")]
    InvalidRank { rank: usize, size: usize },
    /// Broadcast root outside `[0, size)`.
    #[error("broadcast root {root} is outside a group of size {size}")]
    InvalidRoot { root: usize, size: usize },
    /// Broadcast asked for more elements than the buffer holds.
    #[error("broadcast count {count} exceeds buffer length {len}")]
    BroadcastCountMismatch { count: usize, len: usize },
    /// A point-to-point exchange with `neighbor` failed.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// The worker thread pool for a local group could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// MPI was already initialized or could not be initialized.
    #[error("MPI initialization failed")]
    MpiInit,
    /// A local worker panicked; its peers were released with `CommError`.
    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },
}

impl WaveError {
    /// Shorthand used by the exchange paths.
    pub(crate) fn comm(neighbor: usize, reason: impl Into<String>) -> Self {
        WaveError::CommError {
            neighbor,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let e = WaveError::TooManyWorkers {
            workers: 5,
            interior: 3,
        };
        assert_eq!(e.to_string(), "5 workers cannot share 3 interior points");

        let e = WaveError::comm(2, "expected 8 bytes, got 4");
        assert_eq!(
            e.to_string(),
            "communication with rank 2 failed: expected 8 bytes, got 4"
        );
    }
}
