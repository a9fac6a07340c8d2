// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use crate::config::validate_pipeline;
use crate::errors::ConfigError;
use crate::stage::{OnRecordError, StageInfo, StageKind};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for a pipeline.
///
/// This struct represents a complete pipeline definition: its name, how batches
/// are run, and the stages wired together by named lanes. It is loaded from a
/// YAML or TOML file.
///
/// # Fields
/// * `pipeline` - Pipeline name, used in logs and reports
/// * `executor_options` - Batch size and run-loop options (optional)
/// * `stages` - Stage definitions; lanes connect them
///
/// # Example
/// ```yaml
/// pipeline: orders
/// executor_options:
///   batch_size: 100
///   max_batches: 10
/// stages:
///   - name: source
///     kind: source
///     stage: json_list_source
///     output_lanes: [raw]
///     options:
///       records: [{ id: 1 }, { id: 2 }]
///   - name: sink
///     kind: target
///     stage: log_target
///     input_lanes: [raw]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pipeline: String,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    pub stages: Vec<StageConfig>,
}

impl Config {
    /// Stage descriptors in config order.
    pub fn stage_infos(&self) -> Vec<StageInfo> {
        self.stages.iter().map(StageConfig::info).collect()
    }
}

/// Run-loop configuration options.
///
/// # Fields
/// * `batch_size` - Maximum records a source adds per batch (optional)
/// * `max_batches` - Stop after this many batches (optional, unbounded)
/// * `preview` - Drain targets without writing (defaults to false)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorOptions {
    pub batch_size: Option<usize>,
    pub max_batches: Option<usize>,
    #[serde(default)]
    pub preview: bool,
}

impl ExecutorOptions {
    /// Configured batch size, clamped to the allowed range.
    ///
    /// # Example
    /// ```
    /// use lanewise::config::ExecutorOptions;
    ///
    /// let options = ExecutorOptions {
    ///     batch_size: Some(10_000_000),
    ///     ..Default::default()
    /// };
    /// assert_eq!(options.batch_size(), 100_000);
    /// assert_eq!(ExecutorOptions::default().batch_size(), 1_000);
    /// ```
    pub fn batch_size(&self) -> usize {
        self.batch_size
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
    }
}

/// Configuration for a single stage.
///
/// # Fields
/// * `name` - Unique instance name, also the metric namespace
/// * `kind` - Role in the graph: source, processor, target or observer
/// * `stage` - Built-in implementation name
/// * `input_lanes` / `output_lanes` - Lane wiring (default empty)
/// * `on_error` - Policy for bad records (defaults to `to_error`)
/// * `options` - Implementation-specific options
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub kind: StageKind,
    pub stage: String,
    #[serde(default)]
    pub input_lanes: Vec<String>,
    #[serde(default)]
    pub output_lanes: Vec<String>,
    #[serde(default)]
    pub on_error: OnRecordError,
    #[serde(default)]
    pub options: HashMap<String, Value>,
}

impl StageConfig {
    pub fn info(&self) -> StageInfo {
        StageInfo::new(
            self.name.clone(),
            self.kind,
            self.input_lanes.iter().cloned(),
            self.output_lanes.iter().cloned(),
        )
    }
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse config text in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let cfg = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    Ok(cfg)
}

/// Load a config from a `.yaml`, `.yml` or `.toml` file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format)
}

/// Load a config and validate its stage topology.
///
/// All validation errors are reported together in [`ConfigError::Invalid`].
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_pipeline(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
pipeline: orders
stages:
  - name: source
    kind: source
    stage: json_list_source
    output_lanes: [raw]
  - name: validate
    kind: processor
    stage: require_fields
    input_lanes: [raw]
    output_lanes: [valid]
    on_error: discard
  - name: sink
    kind: target
    stage: null_target
    input_lanes: [valid]
"#;

        let cfg = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.pipeline, "orders");
        assert_eq!(cfg.stages.len(), 3);
        assert_eq!(cfg.stages[1].kind, StageKind::Processor);
        assert_eq!(cfg.stages[1].on_error, OnRecordError::Discard);
        assert_eq!(cfg.stages[2].on_error, OnRecordError::ToError);
        assert_eq!(cfg.stages[2].input_lanes, vec!["valid"]);
        assert!(cfg.stages[2].output_lanes.is_empty());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
pipeline = "orders"

[executor_options]
batch_size = 2
preview = true

[[stages]]
name = "source"
kind = "source"
stage = "json_list_source"
output_lanes = ["raw"]

[stages.options]
records = [{ id = 1 }, { id = 2 }]

[[stages]]
name = "sink"
kind = "target"
stage = "null_target"
input_lanes = ["raw"]
"#;

        let cfg = parse_config(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.executor_options.batch_size(), 2);
        assert!(cfg.executor_options.preview);
        assert_eq!(
            cfg.stages[0].options["records"],
            serde_json::json!([{ "id": 1 }, { "id": 2 }])
        );
    }

    #[test]
    fn test_parse_stage_with_options() {
        let yaml = r#"
pipeline: p
stages:
  - name: upper
    kind: processor
    stage: change_text_case
    input_lanes: [raw]
    output_lanes: [out]
    options:
      field: name
      mode: upper
      strict: true
"#;

        let cfg = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        let stage = &cfg.stages[0];

        assert_eq!(stage.options.len(), 3);
        assert_eq!(stage.options["mode"], Value::from("upper"));
        assert_eq!(stage.options["strict"], Value::from(true));
    }

    #[test]
    fn test_executor_options_defaults_and_clamp() {
        let cfg = parse_config("pipeline: p\nstages: []\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.executor_options.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.executor_options.max_batches, None);
        assert!(!cfg.executor_options.preview);

        let zero = ExecutorOptions {
            batch_size: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.batch_size(), MIN_BATCH_SIZE);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let yaml = r#"
pipeline: p
stages:
  - name: s
    kind: reducer
    stage: anything
"#;
        assert!(matches!(
            parse_config(yaml, ConfigFormat::Yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/pipeline.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("pipeline.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("pipeline.json")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_stage_infos_follow_config_order() {
        let yaml = r#"
pipeline: p
stages:
  - name: b
    kind: target
    stage: null_target
    input_lanes: [x]
  - name: a
    kind: source
    stage: json_list_source
    output_lanes: [x]
"#;
        let cfg = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        let infos = cfg.stage_infos();

        assert_eq!(infos[0].instance_name(), "b");
        assert_eq!(infos[1].kind(), StageKind::Source);
        assert_eq!(infos[1].output_lanes(), &["x".to_string()]);
    }
}
