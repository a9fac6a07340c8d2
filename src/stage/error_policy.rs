// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-record error containment for record-at-a-time processors.
//!
//! Each record ends in exactly one state:
//!
//! * **Emitted** - the transform returned `Ok` and whatever output it added
//!   was committed, which may be nothing; counted as `succeeded`
//! * **Discarded** - a declared record error under [`OnRecordError::Discard`]
//! * **SentToError** - a declared record error under [`OnRecordError::ToError`]
//! * **PropagatedFatal** - a declared error under [`OnRecordError::StopPipeline`],
//!   or any other error under every policy; processing stops there
//!
//! Output a transform adds is staged until the transform returns, so a record
//! that fails after adding output never leaves anything behind.

use serde::Deserialize;

use crate::config::consts::DISCARDED_RECORDS_COUNTER;
use crate::errors::{ConsistencyError, StageError};
use crate::observability::messages::{stage::RecordDiscarded, StructuredLog};
use crate::record::Record;
use crate::stage::StageContext;
use crate::traits::{BatchMaker, RecordProcessor};

/// What to do with a record whose transform raised a declared record error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnRecordError {
    /// Drop the record and continue
    Discard,
    /// Hand the record and its error to the error sink and continue
    #[default]
    ToError,
    /// Fail the batch at the first bad record
    StopPipeline,
}

/// How many records ended in each terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcomes {
    pub succeeded: usize,
    pub discarded: usize,
    pub sent_to_error: usize,
}

impl RecordOutcomes {
    pub fn total(&self) -> usize {
        self.succeeded + self.discarded + self.sent_to_error
    }

    pub fn merge(&mut self, other: &RecordOutcomes) {
        self.succeeded += other.succeeded;
        self.discarded += other.discarded;
        self.sent_to_error += other.sent_to_error;
    }
}

/// Drives a [`RecordProcessor`] over a batch under one on-error policy.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicyRunner {
    policy: OnRecordError,
}

impl ErrorPolicyRunner {
    pub fn new(policy: OnRecordError) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> OnRecordError {
        self.policy
    }

    /// Run `processor` over `records` in order.
    ///
    /// Declared record errors are handled per policy; every other error is
    /// returned as soon as it happens.
    pub async fn run(
        &self,
        processor: &dyn RecordProcessor,
        ctx: &StageContext,
        records: Vec<Record>,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<RecordOutcomes, StageError> {
        let mut outcomes = RecordOutcomes::default();

        for record in records {
            let mut staged = StagedOutput::new(&mut *batch_maker);
            let result = processor.process_record(ctx, &record, &mut staged).await;

            match result {
                Ok(()) => {
                    staged.commit()?;
                    outcomes.succeeded += 1;
                }
                Err(StageError::OnRecord(error)) => match self.policy {
                    OnRecordError::Discard => {
                        RecordDiscarded {
                            stage: ctx.instance_name(),
                            record_id: record.source_id(),
                            error: &error,
                        }
                        .log();
                        ctx.create_counter(DISCARDED_RECORDS_COUNTER).increment(1);
                        outcomes.discarded += 1;
                    }
                    OnRecordError::ToError => {
                        ctx.to_error(record, error);
                        outcomes.sent_to_error += 1;
                    }
                    OnRecordError::StopPipeline => return Err(StageError::OnRecord(error)),
                },
                Err(other) => return Err(other),
            }
        }

        Ok(outcomes)
    }
}

/// Output buffer for a single record's transform.
struct StagedOutput<'a> {
    inner: &'a mut dyn BatchMaker,
    pending: Vec<(Record, Vec<String>)>,
}

impl<'a> StagedOutput<'a> {
    fn new(inner: &'a mut dyn BatchMaker) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    fn commit(self) -> Result<(), ConsistencyError> {
        for (record, lanes) in self.pending {
            let lanes: Vec<&str> = lanes.iter().map(String::as_str).collect();
            self.inner.add_record(record, &lanes)?;
        }
        Ok(())
    }
}

impl BatchMaker for StagedOutput<'_> {
    fn check_lanes(&self, lanes: &[&str]) -> Result<(), ConsistencyError> {
        self.inner.check_lanes(lanes)
    }

    fn add_record(&mut self, record: Record, lanes: &[&str]) -> Result<(), ConsistencyError> {
        self.inner.check_lanes(lanes)?;
        self.pending
            .push((record, lanes.iter().map(|l| l.to_string()).collect()));
        Ok(())
    }
}
