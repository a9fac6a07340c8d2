use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::stages::*;
use crate::config::StageConfig;
use crate::errors::StageCreationError;
use crate::stage::{StageImpl, StageKind};

/// Factory for the built-in (in-process) stage implementations.
pub struct LocalStageFactory;

impl LocalStageFactory {
    /// Create the stage implementation named by `config.stage`.
    ///
    /// The implementation must match the configured kind:
    /// - sources: `json_list_source`, `text_lines_source`
    /// - processors: `require_fields`, `change_text_case`, `lane_router`, `merge_lanes`
    /// - targets: `log_target`, `null_target`
    /// - observers: `log_observer`
    pub fn create_stage(config: &StageConfig) -> Result<StageImpl, StageCreationError> {
        let options = Options {
            stage: &config.name,
            values: &config.options,
        };

        let implementation = match config.stage.as_str() {
            "json_list_source" => {
                StageImpl::Source(Arc::new(JsonListSource::new(options.required("records")?)))
            }
            "text_lines_source" => {
                let text: String = options.required("text")?;
                StageImpl::Source(Arc::new(TextLinesSource::new(&text)))
            }
            "require_fields" => StageImpl::RecordProcessor(Arc::new(RequireFieldsProcessor::new(
                options.required("fields")?,
            ))),
            "change_text_case" => {
                let field: String = options.required("field")?;
                let case = options.optional("case")?.unwrap_or(TextCase::Upper);
                StageImpl::RecordProcessor(Arc::new(ChangeTextCaseProcessor::new(field, case)))
            }
            "lane_router" => {
                let field: String = options.required("field")?;
                let value: Value = options.required("value")?;
                let match_lane: String = options.required("match_lane")?;
                let default_lane: String = options.required("default_lane")?;
                StageImpl::RecordProcessor(Arc::new(LaneRouter::new(
                    field,
                    value,
                    match_lane,
                    default_lane,
                )))
            }
            "merge_lanes" => StageImpl::Processor(Arc::new(MergeLanesProcessor)),
            "log_target" => StageImpl::Target(Arc::new(LogTarget)),
            "null_target" => StageImpl::Target(Arc::new(NullTarget)),
            "log_observer" => StageImpl::Observer(Arc::new(LogObserver)),
            other => {
                return Err(StageCreationError::UnknownImplementation {
                    stage: config.name.clone(),
                    implementation: other.to_string(),
                })
            }
        };

        if implementation.kind() != config.kind {
            return Err(StageCreationError::KindMismatch {
                stage: config.name.clone(),
                implementation: config.stage.clone(),
                expected: config.kind,
                actual: implementation.kind(),
            });
        }
        Ok(implementation)
    }

    /// List all available local stage implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "json_list_source",
            "text_lines_source",
            "require_fields",
            "change_text_case",
            "lane_router",
            "merge_lanes",
            "log_target",
            "null_target",
            "log_observer",
        ]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(impl_name: &str) -> bool {
        Self::list_available_implementations().contains(&impl_name)
    }

    /// Kind of the named implementation, if it exists.
    pub fn implementation_kind(impl_name: &str) -> Option<StageKind> {
        match impl_name {
            "json_list_source" | "text_lines_source" => Some(StageKind::Source),
            "require_fields" | "change_text_case" | "lane_router" | "merge_lanes" => {
                Some(StageKind::Processor)
            }
            "log_target" | "null_target" => Some(StageKind::Target),
            "log_observer" => Some(StageKind::Observer),
            _ => None,
        }
    }
}

struct Options<'a> {
    stage: &'a str,
    values: &'a HashMap<String, Value>,
}

impl Options<'_> {
    fn required<T: DeserializeOwned>(&self, option: &'static str) -> Result<T, StageCreationError> {
        self.optional(option)?.ok_or_else(|| StageCreationError::InvalidOption {
            stage: self.stage.to_string(),
            option,
            reason: "required option is missing".to_string(),
        })
    }

    fn optional<T: DeserializeOwned>(
        &self,
        option: &'static str,
    ) -> Result<Option<T>, StageCreationError> {
        self.values
            .get(option)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| StageCreationError::InvalidOption {
                    stage: self.stage.to_string(),
                    option,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}
