// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Failure taxonomy for stage execution.
//!
//! Stage logic returns [`StageError`]. Only the [`StageError::OnRecord`] variant
//! is subject to a stage's on-error policy; consistency violations and fatal
//! failures always abort the batch.

use std::fmt::Display;
use std::sync::Arc;

/// A stable error code plus a message template with `{}` placeholders.
pub trait ErrorCode {
    fn code(&self) -> &str;

    fn template(&self) -> &str;

    /// Render the template, substituting placeholders left to right.
    ///
    /// Surplus placeholders are left as-is, surplus arguments are ignored.
    fn message(&self, args: &[&dyn Display]) -> String {
        let template = self.template();
        let mut rendered = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template;
        while let Some(pos) = rest.find("{}") {
            rendered.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => rendered.push_str(&arg.to_string()),
                None => rendered.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Plain [`ErrorCode`] for stages that declare their codes as constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorId {
    code: &'static str,
    template: &'static str,
}

impl ErrorId {
    pub const fn new(code: &'static str, template: &'static str) -> Self {
        Self { code, template }
    }
}

impl ErrorCode for ErrorId {
    fn code(&self) -> &str {
        self.code
    }

    fn template(&self) -> &str {
        self.template
    }
}

/// A declared, record-scoped failure: this record is bad, the pipeline is not.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RecordError {
    code: String,
    message: String,
    cause: Option<Arc<anyhow::Error>>,
}

impl RecordError {
    pub fn new(code: &dyn ErrorCode, args: &[&dyn Display]) -> Self {
        Self {
            code: code.code().to_string(),
            message: code.message(args),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(Arc::new(cause.into()));
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }
}

impl PartialEq for RecordError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.message == other.message
            && match (&self.cause, &other.cause) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// Contract breaches in stage wiring. Never subject to on-error policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("lane '{0}' is not part of this pipeline run")]
    UnknownLane(String),

    #[error("lane '{lane}' already consumed by stage '{consumer}'")]
    LaneAlreadyConsumed { lane: String, consumer: String },

    #[error("stage '{stage}' does not declare input lane '{lane}'")]
    UndeclaredInputLane { stage: String, lane: String },

    #[error("stage '{stage}' does not declare output lane '{lane}'")]
    UndeclaredOutputLane { stage: String, lane: String },

    #[error("no lane has been specified and stage '{stage}' has output lanes {lanes:?}")]
    AmbiguousOutputLane { stage: String, lanes: Vec<String> },

    #[error("observer stage '{0}' cannot add records")]
    ObserverCannotProduce(String),

    #[error("stage '{0}' has no input to read")]
    InputUnavailable(String),

    #[error("stage '{stage}' left {remaining} input records unconsumed")]
    InputNotConsumed { stage: String, remaining: usize },

    #[error("record source id cannot be empty (stage '{0}')")]
    EmptySourceId(String),
}

/// Everything a stage invocation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    OnRecord(#[from] RecordError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("{0:#}")]
    Fatal(anyhow::Error),
}

impl StageError {
    /// Wrap any failure the stage did not classify as record-scoped.
    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        StageError::Fatal(err.into())
    }

    pub fn is_record_error(&self) -> bool {
        matches!(self, StageError::OnRecord(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: ErrorId = ErrorId::new("FIELD_MISSING", "field '{}' missing in record '{}'");

    #[test]
    fn test_message_substitutes_placeholders_in_order() {
        assert_eq!(
            MISSING.message(&[&"id", &"src::7"]),
            "field 'id' missing in record 'src::7'"
        );
    }

    #[test]
    fn test_message_keeps_unfilled_placeholders() {
        assert_eq!(MISSING.message(&[&"id"]), "field 'id' missing in record '{}'");
    }

    #[test]
    fn test_record_error_display_and_cause() {
        let err = RecordError::new(&MISSING, &[&"id", &"r1"])
            .with_cause(anyhow::anyhow!("lookup failed"));

        assert_eq!(err.code(), "FIELD_MISSING");
        assert_eq!(err.to_string(), "FIELD_MISSING: field 'id' missing in record 'r1'");
        assert_eq!(err.cause().unwrap().to_string(), "lookup failed");
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn test_stage_error_classification() {
        let record: StageError = RecordError::new(&MISSING, &[]).into();
        let fatal = StageError::fatal(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        let wiring: StageError = ConsistencyError::UnknownLane("x".into()).into();

        assert!(record.is_record_error());
        assert!(!fatal.is_record_error());
        assert!(!wiring.is_record_error());
        assert_eq!(fatal.to_string(), "disk");
    }
}
