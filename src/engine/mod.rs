// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Batch execution engine.
//!
//! - [`PipelineRunState`]: the lanes of one traversal
//! - [`LaneView`]: one stage's window onto those lanes
//! - [`Pipeline`]: ordered stages and the traversal loop

pub mod lane_view;
pub mod pipeline;
pub mod run_state;

pub use lane_view::LaneView;
pub use pipeline::{BatchReport, Pipeline, PipelineBuilder, RunOptions, RunReport, StageReport};
pub use run_state::{LaneRecords, PipelineRunState};
