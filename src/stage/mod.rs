// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod context;
mod error_policy;
mod runtime;

pub use context::{SharedRecorder, StageContext};
pub use error_policy::{ErrorPolicyRunner, OnRecordError, RecordOutcomes};
pub use runtime::{LaneMode, StageDefinition, StageImpl, StageInfo, StageKind, StageRuntime};
