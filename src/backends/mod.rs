// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage backend implementations for lanewise pipelines.
//!
//! A backend turns stage configuration into [`StageImpl`](crate::stage::StageImpl)
//! values the engine can run.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust stages:
//! - **Sources**: JSON value lists, lines of text
//! - **Processors**: field validation, text case conversion, lane routing, lane merging
//! - **Targets and observers**: logging and discarding
//! - **Error sinks**: in-memory collection and tracing output
//!
//! Test builds also get `stub`, a metrics recorder that keeps what was reported.
//!
//! # Architecture
//!
//! ```text
//! Configuration → Factory → StageImpl → Pipeline
//! ```
//!
//! # Examples
//!
//! ```rust
//! use lanewise::backends::local::LocalStageFactory;
//! use lanewise::config::StageConfig;
//! use lanewise::stage::{OnRecordError, StageKind};
//! use std::collections::HashMap;
//!
//! let config = StageConfig {
//!     name: "sink".to_string(),
//!     kind: StageKind::Target,
//!     stage: "null_target".to_string(),
//!     input_lanes: vec!["raw".to_string()],
//!     output_lanes: vec![],
//!     on_error: OnRecordError::ToError,
//!     options: HashMap::new(),
//! };
//!
//! let stage = LocalStageFactory::create_stage(&config)?;
//! assert_eq!(stage.kind(), StageKind::Target);
//! # Ok::<(), lanewise::errors::StageCreationError>(())
//! ```

pub mod local;

#[cfg(test)]
pub mod stub;
