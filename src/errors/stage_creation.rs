// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for turning stage configuration into stage instances.

use crate::stage::StageKind;

#[derive(Debug, thiserror::Error)]
pub enum StageCreationError {
    /// No built-in stage has the configured name
    #[error("Unknown local stage implementation '{implementation}' for stage '{stage}'")]
    UnknownImplementation {
        stage: String,
        implementation: String,
    },

    /// The implementation exists but cannot run as the configured kind
    #[error("Stage '{stage}' uses '{implementation}' which is a {actual:?}, not a {expected:?}")]
    KindMismatch {
        stage: String,
        implementation: String,
        expected: StageKind,
        actual: StageKind,
    },

    /// A required option is absent or has the wrong shape
    #[error("Stage '{stage}' has invalid option '{option}': {reason}")]
    InvalidOption {
        stage: String,
        option: &'static str,
        reason: String,
    },
}
