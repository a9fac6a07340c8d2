// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - batch traversal lifecycle and per-stage execution
//! * `stage` - per-record outcomes (discarded, sent to error)
//! * `validation` - topology validation results

use tracing::Span;

pub mod engine;
pub mod stage;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
