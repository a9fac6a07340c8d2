// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConsistencyError;
use crate::record::Record;

/// Read side of a stage's view of the current batch.
pub trait Batch: Send {
    /// Identifier of the batch being traversed, once the source has set it.
    fn batch_id(&self) -> Option<&str>;

    /// Declared input lanes, regardless of what has been consumed.
    fn lanes(&self) -> &[String];

    /// Take records from the given lanes, or from all lanes when `lanes` is empty.
    ///
    /// Records come back in declared lane order, then arrival order, each one a
    /// snapshot tagged with the reading stage's name.
    fn next_records(&mut self, lanes: &[&str]) -> Result<Vec<Record>, ConsistencyError>;
}

/// Write side of a stage's view of the current batch.
pub trait BatchMaker: Send {
    /// Check that `lanes` would be accepted by [`BatchMaker::add_record`]
    /// without adding anything.
    fn check_lanes(&self, lanes: &[&str]) -> Result<(), ConsistencyError>;

    /// Append a record to the named output lanes, or to the single output lane
    /// when `lanes` is empty.
    fn add_record(&mut self, record: Record, lanes: &[&str]) -> Result<(), ConsistencyError>;
}

/// Both sides at once, for stages that read and write the same batch.
pub trait BatchIo: Batch + BatchMaker {}

impl<T: Batch + BatchMaker> BatchIo for T {}
