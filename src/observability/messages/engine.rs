// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for batch traversal lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Traversal start, completion and failure
//! * Per-stage execution results
//! * Records left behind on lanes nobody consumes
//! * Multi-batch run completion

use crate::observability::messages::StructuredLog;
use crate::stage::StageKind;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A batch traversal is starting.
///
/// # Log Level
/// `debug!` - Emitted once per batch
///
/// # Example
/// ```
/// use lanewise::observability::messages::engine::BatchStarted;
///
/// let msg = BatchStarted {
///     pipeline: "orders",
///     previous_batch_id: Some("100"),
///     preview: false,
///     stage_count: 4,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Starting batch for pipeline 'orders' after offset 100: 4 stages"
/// );
/// ```
pub struct BatchStarted<'a> {
    pub pipeline: &'a str,
    pub previous_batch_id: Option<&'a str>,
    pub preview: bool,
    pub stage_count: usize,
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.previous_batch_id {
            Some(offset) => write!(
                f,
                "Starting batch for pipeline '{}' after offset {}: {} stages",
                self.pipeline, offset, self.stage_count
            )?,
            None => write!(
                f,
                "Starting first batch for pipeline '{}': {} stages",
                self.pipeline, self.stage_count
            )?,
        }
        if self.preview {
            write!(f, " (preview)")?;
        }
        Ok(())
    }
}

impl StructuredLog for BatchStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            previous_batch_id = self.previous_batch_id.unwrap_or("-"),
            preview = self.preview,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            pipeline = self.pipeline,
            previous_batch_id = self.previous_batch_id.unwrap_or("-"),
            preview = self.preview,
        )
    }
}

/// A batch traversal finished without error.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use lanewise::observability::messages::engine::BatchCompleted;
/// use std::time::Duration;
///
/// let msg = BatchCompleted {
///     pipeline: "orders",
///     batch_id: Some("200"),
///     produced: 100,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BatchCompleted<'a> {
    pub pipeline: &'a str,
    pub batch_id: Option<&'a str>,
    pub produced: usize,
    pub duration: Duration,
}

impl Display for BatchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch completed for pipeline '{}': {} records produced in {:?}, next offset {}",
            self.pipeline,
            self.produced,
            self.duration,
            self.batch_id.unwrap_or("<exhausted>")
        )
    }
}

impl StructuredLog for BatchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            batch_id = self.batch_id.unwrap_or("-"),
            produced = self.produced,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch_completed",
            span_name = name,
            pipeline = self.pipeline,
            produced = self.produced,
            duration = ?self.duration,
        )
    }
}

/// A stage aborted the traversal.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BatchFailed<'a> {
    pub pipeline: &'a str,
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for BatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch failed for pipeline '{}' at stage '{}': {}",
            self.pipeline, self.stage, self.error
        )
    }
}

impl StructuredLog for BatchFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pipeline = self.pipeline,
            stage = self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "batch_failed",
            span_name = name,
            pipeline = self.pipeline,
            stage = self.stage,
        )
    }
}

/// One stage finished its part of a traversal.
///
/// # Log Level
/// `debug!` - Emitted once per stage per batch
pub struct StageExecuted<'a> {
    pub stage: &'a str,
    pub kind: StageKind,
    pub input: usize,
    pub output: usize,
    pub duration: Duration,
}

impl Display for StageExecuted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' ({:?}) read {} records, wrote {} in {:?}",
            self.stage, self.kind, self.input, self.output, self.duration
        )
    }
}

impl StructuredLog for StageExecuted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            kind = ?self.kind,
            input = self.input,
            output = self.output,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage",
            span_name = name,
            stage = self.stage,
            kind = ?self.kind,
        )
    }
}

/// Records remained on a lane after the traversal ended.
///
/// Lanes without a consumer are legal; their records are dropped with the run
/// state.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct LeftoverRecords<'a> {
    pub pipeline: &'a str,
    pub lane: &'a str,
    pub count: usize,
}

impl Display for LeftoverRecords<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' dropped {} unconsumed records from lane '{}'",
            self.pipeline, self.count, self.lane
        )
    }
}

impl StructuredLog for LeftoverRecords<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            lane = self.lane,
            count = self.count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "leftover_records",
            span_name = name,
            pipeline = self.pipeline,
            lane = self.lane,
        )
    }
}

/// A multi-batch run stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub pipeline: &'a str,
    pub batches: usize,
    pub last_offset: Option<&'a str>,
    pub source_exhausted: bool,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' ran {} batches ({})",
            self.pipeline,
            self.batches,
            if self.source_exhausted {
                "source exhausted"
            } else {
                "batch limit reached"
            }
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            batches = self.batches,
            last_offset = self.last_offset.unwrap_or("-"),
            source_exhausted = self.source_exhausted,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            pipeline = self.pipeline,
            batches = self.batches,
        )
    }
}
