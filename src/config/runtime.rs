// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::local::LocalStageFactory;
use crate::config::Config;
use crate::engine::{Pipeline, RunOptions};
use crate::errors::ExecutionError;
use crate::stage::StageDefinition;
use crate::traits::ErrorSink;

/// Pipeline runtime builder - turns a configuration into a runnable pipeline.
///
/// The `RuntimeBuilder` creates every configured stage through the local stage
/// factory, assembles them into a validated [`Pipeline`], and derives the run
/// options from the executor options.
///
/// # Examples
///
/// ```
/// use lanewise::backends::local::MemoryErrorSink;
/// use lanewise::config::{parse_config, ConfigFormat, RuntimeBuilder};
/// use std::sync::Arc;
///
/// let yaml = r#"
/// pipeline: demo
/// executor_options:
///   max_batches: 1
/// stages:
///   - name: source
///     kind: source
///     stage: json_list_source
///     output_lanes: [raw]
///     options:
///       records: [{ id: 1 }]
///   - name: sink
///     kind: target
///     stage: null_target
///     input_lanes: [raw]
/// "#;
/// let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
///
/// let (pipeline, options) =
///     RuntimeBuilder::from_config(&config, Arc::new(MemoryErrorSink::new())).unwrap();
///
/// assert_eq!(pipeline.name(), "demo");
/// assert_eq!(options.max_batches, Some(1));
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a pipeline and its run options from configuration.
    ///
    /// # Arguments
    /// * `cfg` - Pipeline definition with stages and executor options
    /// * `error_sink` - Destination of records sent to error by any stage
    ///
    /// # Returns
    /// The built [`Pipeline`] and the [`RunOptions`] the configuration asks for
    pub fn from_config(
        cfg: &Config,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Result<(Pipeline, RunOptions), ExecutionError> {
        let definitions = cfg
            .stages
            .iter()
            .map(|stage| {
                LocalStageFactory::create_stage(stage)
                    .map(|implementation| {
                        StageDefinition::new(stage.info(), implementation).on_error(stage.on_error)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pipeline = Pipeline::builder(cfg.pipeline.clone())
            .stages(definitions)
            .batch_size(cfg.executor_options.batch_size())
            .error_sink(error_sink)
            .build()?;

        let options = RunOptions {
            preview: cfg.executor_options.preview,
            max_batches: cfg.executor_options.max_batches,
            start_offset: None,
        };

        Ok((pipeline, options))
    }
}
