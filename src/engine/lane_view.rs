// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A single stage's window onto the run state.
//!
//! The view pulls the stage's declared input lanes out of the
//! [`PipelineRunState`], hands records to the stage through [`Batch`], collects
//! whatever the stage adds through [`BatchMaker`], and pushes that output back
//! on [`LaneView::flush_output`]. Stages never see lanes they did not declare.
//!
//! In observe mode the input is a copy and the view refuses output, so an
//! observer cannot change what downstream stages receive.

use crate::engine::run_state::{LaneRecords, PipelineRunState};
use crate::errors::ConsistencyError;
use crate::record::Record;
use crate::stage::{LaneMode, StageKind, StageRuntime};
use crate::traits::{Batch, BatchMaker};

pub struct LaneView<'a> {
    stage: &'a StageRuntime,
    state: &'a mut PipelineRunState,
    observer: bool,
    input: LaneRecords,
    output: Option<LaneRecords>,
}

impl<'a> LaneView<'a> {
    pub fn new(stage: &'a StageRuntime, state: &'a mut PipelineRunState) -> Self {
        let observer = stage.mode() == LaneMode::Observe;
        let output = (!observer).then(|| {
            stage
                .output_lanes()
                .iter()
                .map(|lane| (lane.clone(), Vec::new()))
                .collect()
        });
        Self {
            stage,
            state,
            observer,
            input: Vec::new(),
            output,
        }
    }

    /// Pull the declared input lanes out of the run state.
    ///
    /// Transform views drain the lanes; observe views copy them. Returns the
    /// number of records extracted.
    pub fn extract_input(&mut self) -> Result<usize, ConsistencyError> {
        let lanes = self.stage.input_lanes();
        self.input = if self.observer {
            self.state.peek_lanes(lanes)?
        } else {
            self.state.drain_lanes(self.stage.name(), lanes)?
        };
        Ok(self.remaining_input())
    }

    pub fn is_observer(&self) -> bool {
        self.observer
    }

    pub fn is_input_fully_consumed(&self) -> bool {
        self.input.iter().all(|(_, records)| records.is_empty())
    }

    /// Records extracted but not yet handed to the stage.
    pub fn remaining_input(&self) -> usize {
        self.input.iter().map(|(_, records)| records.len()).sum()
    }

    /// Records added so far, across all output lanes.
    pub fn pending_output(&self) -> usize {
        self.output
            .as_ref()
            .map(|lanes| lanes.iter().map(|(_, records)| records.len()).sum())
            .unwrap_or(0)
    }

    pub fn previous_batch_id(&self) -> Option<&str> {
        self.state.previous_batch_id()
    }

    pub fn is_preview(&self) -> bool {
        self.state.is_preview()
    }

    /// Push collected output back into the run state.
    ///
    /// Observers have nothing to flush. Returns the number of records written.
    pub fn flush_output(self) -> Result<usize, ConsistencyError> {
        match self.output {
            Some(output) => {
                let written = output.iter().map(|(_, records)| records.len()).sum();
                self.state.populate_lanes(output)?;
                Ok(written)
            }
            None => Ok(0),
        }
    }

    fn resolve_output_lanes(&self, lanes: &[&str]) -> Result<Vec<usize>, ConsistencyError> {
        let output = match &self.output {
            Some(output) => output,
            None => {
                return Err(ConsistencyError::ObserverCannotProduce(
                    self.stage.name().to_string(),
                ))
            }
        };

        if lanes.is_empty() {
            return match output.len() {
                1 => Ok(vec![0]),
                _ => Err(ConsistencyError::AmbiguousOutputLane {
                    stage: self.stage.name().to_string(),
                    lanes: self.stage.output_lanes().to_vec(),
                }),
            };
        }

        lanes
            .iter()
            .map(|lane| {
                output
                    .iter()
                    .position(|(name, _)| name == lane)
                    .ok_or_else(|| ConsistencyError::UndeclaredOutputLane {
                        stage: self.stage.name().to_string(),
                        lane: lane.to_string(),
                    })
            })
            .collect()
    }
}

impl Batch for LaneView<'_> {
    fn batch_id(&self) -> Option<&str> {
        self.state.batch_id()
    }

    fn lanes(&self) -> &[String] {
        self.stage.input_lanes()
    }

    fn next_records(&mut self, lanes: &[&str]) -> Result<Vec<Record>, ConsistencyError> {
        if self.stage.kind() == StageKind::Source {
            return Err(ConsistencyError::InputUnavailable(
                self.stage.name().to_string(),
            ));
        }

        let selected: Vec<usize> = if lanes.is_empty() {
            (0..self.input.len()).collect()
        } else {
            lanes
                .iter()
                .map(|lane| {
                    self.input
                        .iter()
                        .position(|(name, _)| name == lane)
                        .ok_or_else(|| ConsistencyError::UndeclaredInputLane {
                            stage: self.stage.name().to_string(),
                            lane: lane.to_string(),
                        })
                })
                .collect::<Result<_, _>>()?
        };

        let stage_name = self.stage.name();
        let mut records = Vec::new();
        for index in selected {
            let taken = std::mem::take(&mut self.input[index].1);
            records.extend(taken.iter().map(|record| record.snapshot(stage_name)));
        }
        Ok(records)
    }
}

impl BatchMaker for LaneView<'_> {
    fn check_lanes(&self, lanes: &[&str]) -> Result<(), ConsistencyError> {
        self.resolve_output_lanes(lanes).map(|_| ())
    }

    fn add_record(&mut self, record: Record, lanes: &[&str]) -> Result<(), ConsistencyError> {
        let targets = self.resolve_output_lanes(lanes)?;
        if let (Some(output), Some((last, rest))) = (self.output.as_mut(), targets.split_last()) {
            for &index in rest {
                output[index].1.push(record.clone());
            }
            output[*last].1.push(record);
        }
        Ok(())
    }
}
