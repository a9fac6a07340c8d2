// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use dependency_graph::StageGraph;
pub use loader::{
    load_and_validate_config, load_config, parse_config, Config, ConfigFormat, ExecutorOptions,
    StageConfig,
};
pub use runtime::RuntimeBuilder;
pub use validation::{lane_names, validate_pipeline, validate_stage_topology};
