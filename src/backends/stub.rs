// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

use crate::stage::SharedRecorder;

/// A recorder for tests that keeps everything a pipeline reports.
pub struct StubRecorder {
    recorder: Arc<DebuggingRecorder>,
    snapshotter: Snapshotter,
}

impl StubRecorder {
    pub fn new() -> Self {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        Self {
            recorder: Arc::new(recorder),
            snapshotter,
        }
    }

    pub fn shared(&self) -> SharedRecorder {
        self.recorder.clone()
    }

    /// Counter values and histogram samples reported so far, by metric name.
    ///
    /// Take one snapshot per check; histogram samples may be drained by it.
    pub fn snapshot(&self) -> RecordedMetrics {
        let mut recorded = RecordedMetrics::default();
        for (key, _, _, value) in self.snapshotter.snapshot().into_vec() {
            let name = key.key().name().to_string();
            match value {
                DebugValue::Counter(count) => {
                    recorded.counters.insert(name, count);
                }
                DebugValue::Histogram(samples) => {
                    recorded
                        .histograms
                        .insert(name, samples.into_iter().map(|s| s.into_inner()).collect());
                }
                DebugValue::Gauge(_) => {}
            }
        }
        recorded
    }
}

#[derive(Debug, Default)]
pub struct RecordedMetrics {
    counters: HashMap<String, u64>,
    histograms: HashMap<String, Vec<f64>>,
}

impl RecordedMetrics {
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn histogram(&self, name: &str) -> Option<&[f64]> {
        self.histograms.get(name).map(Vec::as_slice)
    }
}
