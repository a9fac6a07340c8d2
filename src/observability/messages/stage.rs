// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-record outcomes inside a stage.

use crate::errors::{RecordError, StageError};
use crate::observability::messages::StructuredLog;
use crate::traits::ErrorCause;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A bad record was dropped under the discard policy.
///
/// # Log Level
/// `debug!` - Expected under the configured policy
///
/// # Example
/// ```
/// use lanewise::errors::{ErrorId, RecordError};
/// use lanewise::observability::messages::stage::RecordDiscarded;
///
/// const MISSING: ErrorId = ErrorId::new("FIELD_MISSING", "field '{}' missing");
/// let error = RecordError::new(&MISSING, &[&"id"]);
/// let msg = RecordDiscarded {
///     stage: "validate",
///     record_id: "orders.json:7",
///     error: &error,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Stage 'validate' discarded record 'orders.json:7': FIELD_MISSING: field 'id' missing"
/// );
/// ```
pub struct RecordDiscarded<'a> {
    pub stage: &'a str,
    pub record_id: &'a str,
    pub error: &'a RecordError,
}

impl Display for RecordDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' discarded record '{}': {}",
            self.stage, self.record_id, self.error
        )
    }
}

impl StructuredLog for RecordDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            record_id = self.record_id,
            error_code = self.error.code(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "record_discarded",
            span_name = name,
            stage = self.stage,
            record_id = self.record_id,
        )
    }
}

/// A record was handed to the error sink.
///
/// # Log Level
/// `warn!` - Data needs attention, pipeline keeps running
pub struct RecordSentToError<'a> {
    pub stage: &'a str,
    pub record_id: &'a str,
    pub cause: &'a ErrorCause,
}

impl Display for RecordSentToError<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' sent record '{}' to error: {}",
            self.stage, self.record_id, self.cause
        )
    }
}

impl StructuredLog for RecordSentToError<'_> {
    fn log(&self) {
        tracing::warn!(
            stage = self.stage,
            record_id = self.record_id,
            cause = %self.cause,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "record_sent_to_error",
            span_name = name,
            stage = self.stage,
            record_id = self.record_id,
        )
    }
}

/// Stage logic returned an error that aborts the batch.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StageFailed<'a> {
    pub stage: &'a str,
    pub error: &'a StageError,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let class = match self.error {
            StageError::OnRecord(_) => "record error",
            StageError::Consistency(_) => "consistency error",
            StageError::Fatal(_) => "error",
        };
        write!(f, "Stage '{}' failed with {}: {}", self.stage, class, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::error!(
            stage = self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("stage_failed", span_name = name, stage = self.stage)
    }
}

/// Preview mode: a target's input was drained but not written.
pub struct PreviewWriteSkipped<'a> {
    pub stage: &'a str,
    pub records: usize,
}

impl Display for PreviewWriteSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Preview: target '{}' skipped writing {} records",
            self.stage, self.records
        )
    }
}

impl StructuredLog for PreviewWriteSkipped<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, records = self.records, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("preview_write_skipped", span_name = name, stage = self.stage)
    }
}

/// A target wrote a record to the log.
///
/// # Log Level
/// `info!` - Pipeline output
pub struct RecordWritten<'a> {
    pub stage: &'a str,
    pub record_id: &'a str,
    pub value: &'a serde_json::Value,
}

impl Display for RecordWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] {} => {}", self.stage, self.record_id, self.value)
    }
}

impl StructuredLog for RecordWritten<'_> {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            record_id = self.record_id,
            value = %self.value,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("record_written", span_name = name, stage = self.stage)
    }
}

/// An observer saw a record in flight.
///
/// # Log Level
/// `debug!` - Preview and introspection output
pub struct RecordObserved<'a> {
    pub stage: &'a str,
    pub record_id: &'a str,
    pub trail: &'a [&'a str],
}

impl Display for RecordObserved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Observer '{}' saw record '{}' via {}",
            self.stage,
            self.record_id,
            self.trail.join(" -> ")
        )
    }
}

impl StructuredLog for RecordObserved<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            record_id = self.record_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("record_observed", span_name = name, stage = self.stage)
    }
}
