// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-scoped store of in-flight records, keyed by lane.
//!
//! One [`PipelineRunState`] exists per batch traversal. Every lane of the
//! pipeline is created up front, so a lane lookup can only fail when a stage
//! names a lane the pipeline never declared.

use std::collections::HashMap;

use crate::errors::ConsistencyError;
use crate::record::Record;

/// Records grouped by lane, in the order the lanes were requested.
pub type LaneRecords = Vec<(String, Vec<Record>)>;

#[derive(Debug)]
pub struct PipelineRunState {
    batch_id: Option<String>,
    previous_batch_id: Option<String>,
    preview: bool,
    lanes: HashMap<String, Vec<Record>>,
    consumers: HashMap<String, String>,
}

impl PipelineRunState {
    pub fn new<I>(previous_batch_id: Option<String>, preview: bool, lane_names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            batch_id: None,
            previous_batch_id,
            preview,
            lanes: lane_names
                .into_iter()
                .map(|name| (name.into(), Vec::new()))
                .collect(),
            consumers: HashMap::new(),
        }
    }

    /// Remove and return the whole queue of each named lane.
    ///
    /// Nothing is removed unless every name is known and none of the lanes was
    /// already drained by a different consumer in this traversal.
    pub fn drain_lanes(
        &mut self,
        consumer: &str,
        lanes: &[String],
    ) -> Result<LaneRecords, ConsistencyError> {
        for lane in lanes {
            if !self.lanes.contains_key(lane) {
                return Err(ConsistencyError::UnknownLane(lane.clone()));
            }
            if let Some(previous) = self.consumers.get(lane) {
                if previous != consumer {
                    return Err(ConsistencyError::LaneAlreadyConsumed {
                        lane: lane.clone(),
                        consumer: previous.clone(),
                    });
                }
            }
        }

        let mut drained = Vec::with_capacity(lanes.len());
        for lane in lanes {
            self.consumers
                .entry(lane.clone())
                .or_insert_with(|| consumer.to_string());
            let records = self
                .lanes
                .get_mut(lane)
                .map(std::mem::take)
                .unwrap_or_default();
            drained.push((lane.clone(), records));
        }
        Ok(drained)
    }

    /// Copy each named lane's contents, leaving the lanes untouched.
    pub fn peek_lanes(&self, lanes: &[String]) -> Result<LaneRecords, ConsistencyError> {
        lanes
            .iter()
            .map(|lane| {
                self.lanes
                    .get(lane)
                    .map(|records| (lane.clone(), records.clone()))
                    .ok_or_else(|| ConsistencyError::UnknownLane(lane.clone()))
            })
            .collect()
    }

    /// Append each lane's records to the lane's queue.
    pub fn populate_lanes(&mut self, output: LaneRecords) -> Result<(), ConsistencyError> {
        if let Some((lane, _)) = output.iter().find(|(lane, _)| !self.lanes.contains_key(lane)) {
            return Err(ConsistencyError::UnknownLane(lane.clone()));
        }
        for (lane, mut records) in output {
            if let Some(queue) = self.lanes.get_mut(&lane) {
                queue.append(&mut records);
            }
        }
        Ok(())
    }

    pub fn batch_id(&self) -> Option<&str> {
        self.batch_id.as_deref()
    }

    pub fn set_batch_id(&mut self, batch_id: Option<String>) {
        self.batch_id = batch_id;
    }

    pub fn previous_batch_id(&self) -> Option<&str> {
        self.previous_batch_id.as_deref()
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Number of records queued on a lane, `None` for unknown lanes.
    pub fn lane_len(&self, lane: &str) -> Option<usize> {
        self.lanes.get(lane).map(Vec::len)
    }

    /// Non-empty lanes and their queue lengths, sorted by lane name.
    pub fn pending_records(&self) -> Vec<(String, usize)> {
        let mut pending: Vec<(String, usize)> = self
            .lanes
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(lane, records)| (lane.clone(), records.len()))
            .collect();
        pending.sort();
        pending
    }
}
