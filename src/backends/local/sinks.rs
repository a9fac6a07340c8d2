// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error sinks for records that failed in a stage.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::{ErrorRecord, ErrorSink};

/// Keeps every error record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    errors: Mutex<Vec<ErrorRecord>>,
}

impl MemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything accepted so far.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.lock().clone()
    }

    /// Remove and return everything accepted so far.
    pub fn take(&self) -> Vec<ErrorRecord> {
        std::mem::take(&mut *self.errors.lock())
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl ErrorSink for MemoryErrorSink {
    fn accept(&self, error: ErrorRecord) {
        self.errors.lock().push(error);
    }
}

/// Logs each error record and counts them.
#[derive(Debug, Default)]
pub struct TracingErrorSink {
    accepted: AtomicU64,
}

impl TracingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

impl ErrorSink for TracingErrorSink {
    fn accept(&self, error: ErrorRecord) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            stage = %error.stage,
            record_id = %error.record.qualified_id(),
            error_code = error.error_code().unwrap_or("-"),
            value = %error.record.value(),
            "Error record: {}",
            error.cause
        );
    }
}
