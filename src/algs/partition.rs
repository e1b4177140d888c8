//! Contiguous block partitioning of the interior index space.
//!
//! The interior `[1, i_max-1)` is cut into `size` shares of
//! `floor((i_max-2)/size)` points; the last worker also takes the remainder.
//! Every worker computes every range locally, so no communication is needed
//! to agree on ownership.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::wave_error::WaveError;

/// The half-open interior range owned by one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub rank: usize,
    pub size: usize,
    pub start: usize,
    pub stop: usize,
}

impl Partition {
    pub fn range(&self) -> Range<usize> {
        self.start..self.stop
    }

    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    /// Always false for a validated partition.
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    /// Whether `start-1` is a halo cell owned by `rank-1`.
    pub fn has_left_neighbor(&self) -> bool {
        self.rank > 0
    }

    /// Whether `stop` is a halo cell owned by `rank+1`.
    pub fn has_right_neighbor(&self) -> bool {
        self.rank + 1 < self.size
    }

    /// Owned points whose stencil reads no halo cell.
    pub fn interior(&self) -> Range<usize> {
        let lo = self.start + 1;
        let hi = self.stop.saturating_sub(1).max(lo);
        lo..hi
    }
}

/// Reject configurations that would leave a worker without a point.
pub fn validate_group(i_max: usize, size: usize) -> Result<(), WaveError> {
    if i_max < 3 {
        return Err(WaveError::FieldTooSmall { i_max });
    }
    if size == 0 {
        return Err(WaveError::EmptyGroup);
    }
    let interior = i_max - 2;
    if size > interior {
        return Err(WaveError::TooManyWorkers {
            workers: size,
            interior,
        });
    }
    Ok(())
}

/// The range owned by `rank` in a group of `size` over a field of `i_max`
/// points.
///
/// # Errors
/// `FieldTooSmall`, `EmptyGroup`, `TooManyWorkers` or `InvalidRank` for
/// configurations with no valid assignment.
pub fn owned_range(i_max: usize, size: usize, rank: usize) -> Result<Partition, WaveError> {
    validate_group(i_max, size)?;
    if rank >= size {
        return Err(WaveError::InvalidRank { rank, size });
    }
    let share = (i_max - 2) / size;
    let start = rank * share + 1;
    let stop = if rank == size - 1 {
        i_max - 1
    } else {
        start + share
    };
    Ok(Partition {
        rank,
        size,
        start,
        stop,
    })
}

/// Every worker's partition, in rank order.
pub fn partitions(i_max: usize, size: usize) -> Result<Vec<Partition>, WaveError> {
    (0..size).map(|r| owned_range(i_max, size, r)).collect()
}
