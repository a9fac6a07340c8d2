// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

/// Errors found while validating a pipeline's stage topology.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A cycle exists among stages connected by lanes
    CyclicDependency {
        /// Stage names along the cycle, first name repeated at the end
        cycle: Vec<String>,
    },
    /// A stage consumes a lane that no stage produces
    UnresolvedLane {
        stage: String,
        lane: String,
    },
    /// Two stages share an instance name
    DuplicateStageName {
        stage: String,
    },
    /// More than one stage writes to the same lane
    MultipleProducers {
        lane: String,
        producers: Vec<String>,
    },
    /// More than one non-observer stage drains the same lane
    MultipleConsumers {
        lane: String,
        consumers: Vec<String>,
    },
    /// A pipeline needs exactly one source
    SourceCount {
        found: usize,
    },
    /// A stage's lane declarations do not fit its kind
    InvalidLaneShape {
        stage: String,
        reason: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedLane { stage, lane } => {
                write!(
                    f,
                    "Stage '{}' reads lane '{}' which no stage produces",
                    stage, lane
                )
            }
            ValidationError::DuplicateStageName { stage } => {
                write!(f, "Duplicate stage name: '{}'", stage)
            }
            ValidationError::MultipleProducers { lane, producers } => {
                write!(
                    f,
                    "Lane '{}' has multiple producers: {}",
                    lane,
                    producers.join(", ")
                )
            }
            ValidationError::MultipleConsumers { lane, consumers } => {
                write!(
                    f,
                    "Lane '{}' has multiple consumers: {}",
                    lane,
                    consumers.join(", ")
                )
            }
            ValidationError::SourceCount { found } => {
                write!(f, "Pipeline must have exactly one source stage, found {}", found)
            }
            ValidationError::InvalidLaneShape { stage, reason } => {
                write!(f, "Stage '{}' has invalid lanes: {}", stage, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while reading a pipeline file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format '{0}', expected .yaml, .yml or .toml")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
