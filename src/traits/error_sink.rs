// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::time::SystemTime;

use crate::errors::RecordError;
use crate::record::Record;

/// Why a record was sent to the error sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorCause {
    /// A declared record error, passed through untouched
    Declared(RecordError),
    /// A code plus rendered message supplied directly by stage code
    Coded { code: String, message: String },
    /// Free-form message, or the rendering of an arbitrary error
    Message(String),
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCause::Declared(err) => write!(f, "{}", err),
            ErrorCause::Coded { code, message } => write!(f, "{}: {}", code, message),
            ErrorCause::Message(message) => write!(f, "{}", message),
        }
    }
}

/// One record handed to the error sink.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub stage: String,
    pub record: Record,
    pub cause: ErrorCause,
    pub failed_at: SystemTime,
}

impl ErrorRecord {
    pub fn error_code(&self) -> Option<&str> {
        match &self.cause {
            ErrorCause::Declared(err) => Some(err.code()),
            ErrorCause::Coded { code, .. } => Some(code),
            ErrorCause::Message(_) => None,
        }
    }
}

/// Destination for records that failed in a stage.
///
/// Accepting is infallible: the sink is the terminal handling path, so storage
/// problems are the sink's own to report.
pub trait ErrorSink: Send + Sync {
    fn accept(&self, error: ErrorRecord);
}
