// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod stage;
mod stage_creation;

pub use config::{ConfigError, ValidationError};
pub use execution::ExecutionError;
pub use stage::{ConsistencyError, ErrorCode, ErrorId, RecordError, StageError};
pub use stage_creation::StageCreationError;
