// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{StageCreationError, StageError, ValidationError};

/// Failures surfaced to whoever runs a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// A stage aborted the batch traversal
    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: StageError,
    },

    /// The stage set cannot form a runnable pipeline
    #[error("invalid pipeline: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    InvalidPipeline(Vec<ValidationError>),

    #[error(transparent)]
    StageCreation(#[from] StageCreationError),

    #[error("Internal consistency error: {message}")]
    InternalError { message: String },
}

impl ExecutionError {
    /// The stage error behind a failed traversal, if any.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            ExecutionError::StageFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
