// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline topology validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic stage dependency detected.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use lanewise::observability::messages::validation::CyclicDependencyDetected;
///
/// let cycle = vec!["a", "b", "a"];
/// let msg = CyclicDependencyDetected { cycle: &cycle };
///
/// assert_eq!(msg.to_string(), "Cyclic stage dependency detected: a -> b -> a");
/// ```
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [&'a str],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic stage dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cyclic_dependency",
            span_name = name,
            cycle_length = self.cycle.len(),
        )
    }
}

/// Validation finished cleanly.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct ValidationCompleted {
    pub stage_count: usize,
    pub lane_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline validation passed: {} stages, {} lanes",
            self.stage_count, self.lane_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::debug!(
            stage_count = self.stage_count,
            lane_count = self.lane_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "validation_completed",
            span_name = name,
            stage_count = self.stage_count,
        )
    }
}

/// Validation rejected the pipeline.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline validation failed with {} errors", self.error_count)
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "validation_failed",
            span_name = name,
            error_count = self.error_count,
        )
    }
}
