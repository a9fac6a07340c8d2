// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Batch traversal orchestration.
//!
//! A [`Pipeline`] owns its stages in execution order. Each call to
//! [`Pipeline::run_batch`] builds a fresh [`PipelineRunState`] holding every
//! lane, then walks the stages: build a [`LaneView`], extract input, invoke the
//! stage, flush output. The first stage error aborts the traversal and the
//! failing stage's output is never flushed.
//!
//! Traversals share nothing but the pipeline itself, which is read-only while
//! running, so independent traversals may run concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backends::local::TracingErrorSink;
use crate::config::consts::{
    BATCH_PROCESSING_TIMER, DEFAULT_BATCH_SIZE, INPUT_RECORDS_METER, MAX_BATCH_SIZE,
    MIN_BATCH_SIZE, OUTPUT_RECORDS_METER,
};
use crate::config::{lane_names, validate_stage_topology, StageGraph};
use crate::engine::lane_view::LaneView;
use crate::engine::run_state::PipelineRunState;
use crate::errors::{ConsistencyError, ExecutionError, StageCreationError, StageError};
use crate::observability::messages::engine::{
    BatchCompleted, BatchFailed, BatchStarted, LeftoverRecords, RunCompleted, StageExecuted,
};
use crate::observability::messages::stage::{PreviewWriteSkipped, StageFailed};
use crate::observability::messages::StructuredLog;
use crate::stage::{
    LaneMode, RecordOutcomes, SharedRecorder, StageContext, StageDefinition, StageImpl, StageKind,
    StageRuntime,
};
use crate::traits::{Batch, ErrorSink};

/// What one stage did during one traversal, or summed over a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: String,
    pub kind: StageKind,
    pub input: usize,
    pub output: usize,
    /// Per-record outcomes, for stages run through the error policy
    pub outcomes: Option<RecordOutcomes>,
    pub duration: Duration,
}

impl StageReport {
    fn empty(stage: &StageRuntime) -> Self {
        Self {
            stage: stage.name().to_string(),
            kind: stage.kind(),
            input: 0,
            output: 0,
            outcomes: None,
            duration: Duration::ZERO,
        }
    }

    fn absorb(&mut self, other: &StageReport) {
        self.input += other.input;
        self.output += other.output;
        self.duration += other.duration;
        if let Some(outcomes) = &other.outcomes {
            self.outcomes
                .get_or_insert_with(RecordOutcomes::default)
                .merge(outcomes);
        }
    }
}

/// Result of a single batch traversal.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Offset reported by the source, `None` once the source is exhausted
    pub batch_id: Option<String>,
    pub source_exhausted: bool,
    /// One entry per stage, in execution order
    pub stages: Vec<StageReport>,
    /// Records left on lanes without a consumer
    pub leftover_records: usize,
}

impl BatchReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

/// Options for a multi-batch run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub preview: bool,
    /// Stop after this many batches; unbounded when `None`
    pub max_batches: Option<usize>,
    /// Offset handed to the source on the first batch
    pub start_offset: Option<String>,
}

/// Totals of a multi-batch run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub batches: usize,
    /// Last offset reported by the source
    pub last_offset: Option<String>,
    pub source_exhausted: bool,
    /// Per-stage totals, in execution order
    pub stages: Vec<StageReport>,
    pub leftover_records: usize,
}

impl RunReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

/// Builder collecting stage definitions and shared services for a [`Pipeline`].
pub struct PipelineBuilder {
    name: String,
    definitions: Vec<StageDefinition>,
    error_sink: Option<Arc<dyn ErrorSink>>,
    recorder: Option<SharedRecorder>,
    batch_size: usize,
}

impl PipelineBuilder {
    pub fn stage(mut self, definition: StageDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn stages(mut self, definitions: impl IntoIterator<Item = StageDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Where records sent to error end up; defaults to a [`TracingErrorSink`].
    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Report stage metrics to `recorder` instead of the global recorder.
    pub fn recorder(mut self, recorder: SharedRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Maximum records a source may add per batch, clamped to the allowed range.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        self
    }

    /// Validate the topology, order the stages and create their contexts.
    pub fn build(self) -> Result<Pipeline, ExecutionError> {
        for definition in &self.definitions {
            let actual = definition.implementation.kind();
            if actual != definition.info.kind() {
                return Err(StageCreationError::KindMismatch {
                    stage: definition.info.instance_name().to_string(),
                    implementation: format!("{:?}", definition.implementation),
                    expected: definition.info.kind(),
                    actual,
                }
                .into());
            }
        }

        let infos: Vec<_> = self.definitions.iter().map(|d| d.info.clone()).collect();
        validate_stage_topology(&infos).map_err(ExecutionError::InvalidPipeline)?;
        let graph = StageGraph::from_infos(&infos);
        let order = graph
            .topological_order()
            .map_err(|e| ExecutionError::InvalidPipeline(vec![e]))?;

        let error_sink: Arc<dyn ErrorSink> = match self.error_sink {
            Some(sink) => sink,
            None => Arc::new(TracingErrorSink::new()),
        };

        let mut definitions: Vec<Option<StageDefinition>> =
            self.definitions.into_iter().map(Some).collect();
        let mut stages = Vec::with_capacity(order.len());
        for &index in &order {
            let definition = definitions[index]
                .take()
                .ok_or_else(|| ExecutionError::InternalError {
                    message: format!("stage index {} scheduled twice", index),
                })?;
            let upstream_set = graph.upstream_of(index);
            let pipeline_info = order
                .iter()
                .filter(|i| upstream_set.contains(i))
                .map(|&i| infos[i].clone())
                .collect();
            let context = StageContext::new(
                definition.info.instance_name(),
                definition.info.output_lanes().to_vec(),
                pipeline_info,
                definition.on_error,
                self.recorder.clone(),
                Arc::clone(&error_sink),
            );
            stages.push(StageRuntime::new(
                definition.info,
                definition.implementation,
                context,
            ));
        }

        Ok(Pipeline {
            name: self.name,
            lanes: lane_names(&infos),
            stages,
            batch_size: self.batch_size,
        })
    }
}

/// A validated, ordered set of stages ready to run batches.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    lanes: Vec<String>,
    stages: Vec<StageRuntime>,
    batch_size: usize,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            definitions: Vec::new(),
            error_sink: None,
            recorder: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[StageRuntime] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&StageRuntime> {
        self.stages.iter().find(|s| s.name() == name)
    }

    pub fn lanes(&self) -> &[String] {
        &self.lanes
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run one batch traversal through every stage.
    ///
    /// # Arguments
    /// * `previous_batch_id` - Offset the source resumes from
    /// * `preview` - When set, targets drain their input without writing it
    ///
    /// # Errors
    /// [`ExecutionError::StageFailed`] naming the first stage that failed.
    pub async fn run_batch(
        &self,
        previous_batch_id: Option<String>,
        preview: bool,
    ) -> Result<BatchReport, ExecutionError> {
        let started = Instant::now();
        BatchStarted {
            pipeline: &self.name,
            previous_batch_id: previous_batch_id.as_deref(),
            preview,
            stage_count: self.stages.len(),
        }
        .log();

        let mut state = PipelineRunState::new(previous_batch_id, preview, self.lanes.iter().cloned());
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            match self.run_stage(stage, &mut state).await {
                Ok(report) => {
                    StageExecuted {
                        stage: stage.name(),
                        kind: stage.kind(),
                        input: report.input,
                        output: report.output,
                        duration: report.duration,
                    }
                    .log();
                    reports.push(report);
                }
                Err(source) => {
                    StageFailed {
                        stage: stage.name(),
                        error: &source,
                    }
                    .log();
                    let error = ExecutionError::StageFailed {
                        stage: stage.name().to_string(),
                        source,
                    };
                    BatchFailed {
                        pipeline: &self.name,
                        stage: stage.name(),
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            }
        }

        let mut leftover_records = 0;
        for (lane, count) in state.pending_records() {
            LeftoverRecords {
                pipeline: &self.name,
                lane: &lane,
                count,
            }
            .log();
            leftover_records += count;
        }

        let produced = reports
            .iter()
            .find(|r| r.kind == StageKind::Source)
            .map(|r| r.output)
            .unwrap_or(0);
        BatchCompleted {
            pipeline: &self.name,
            batch_id: state.batch_id(),
            produced,
            duration: started.elapsed(),
        }
        .log();

        Ok(BatchReport {
            batch_id: state.batch_id().map(str::to_string),
            source_exhausted: state.batch_id().is_none(),
            stages: reports,
            leftover_records,
        })
    }

    /// Run batches until the source is exhausted or the batch limit is reached.
    ///
    /// Each batch resumes from the offset the previous batch's source reported.
    pub async fn run(&self, options: RunOptions) -> Result<RunReport, ExecutionError> {
        let mut report = RunReport {
            batches: 0,
            last_offset: options.start_offset.clone(),
            source_exhausted: false,
            stages: self.stages.iter().map(StageReport::empty).collect(),
            leftover_records: 0,
        };

        while options.max_batches.map_or(true, |max| report.batches < max) {
            let batch = self
                .run_batch(report.last_offset.clone(), options.preview)
                .await?;

            report.batches += 1;
            report.leftover_records += batch.leftover_records;
            for (total, stage) in report.stages.iter_mut().zip(&batch.stages) {
                total.absorb(stage);
            }

            if batch.source_exhausted {
                report.source_exhausted = true;
                break;
            }
            report.last_offset = batch.batch_id;
        }

        RunCompleted {
            pipeline: &self.name,
            batches: report.batches,
            last_offset: report.last_offset.as_deref(),
            source_exhausted: report.source_exhausted,
        }
        .log();

        Ok(report)
    }

    async fn run_stage(
        &self,
        stage: &StageRuntime,
        state: &mut PipelineRunState,
    ) -> Result<StageReport, StageError> {
        let ctx = stage.context();
        let started = Instant::now();

        let mut view = LaneView::new(stage, state);
        let input = view.extract_input()?;
        let mut outcomes = None;
        let mut next_offset = None;

        match stage.implementation() {
            StageImpl::Source(source) => {
                let previous = view.previous_batch_id().map(str::to_string);
                let offset = source
                    .produce(ctx, previous.as_deref(), self.batch_size, &mut view)
                    .await?;
                next_offset = Some(offset);
            }
            StageImpl::Processor(processor) => processor.process(ctx, &mut view).await?,
            StageImpl::RecordProcessor(processor) => {
                let records = view.next_records(&[])?;
                let result = stage
                    .error_policy()
                    .run(&**processor, ctx, records, &mut view)
                    .await?;
                outcomes = Some(result);
            }
            StageImpl::Target(target) => {
                if view.is_preview() {
                    let skipped = view.next_records(&[])?;
                    PreviewWriteSkipped {
                        stage: stage.name(),
                        records: skipped.len(),
                    }
                    .log();
                } else {
                    target.write(ctx, &mut view).await?;
                }
            }
            StageImpl::Observer(observer) => observer.observe(ctx, &mut view).await?,
        }

        if stage.mode() == LaneMode::Transform && !view.is_input_fully_consumed() {
            return Err(ConsistencyError::InputNotConsumed {
                stage: stage.name().to_string(),
                remaining: view.remaining_input(),
            }
            .into());
        }

        let output = view.flush_output()?;
        if let Some(offset) = next_offset {
            state.set_batch_id(offset);
        }

        ctx.create_timer(BATCH_PROCESSING_TIMER)
            .record(started.elapsed().as_secs_f64());
        ctx.create_meter(INPUT_RECORDS_METER).increment(input as u64);
        ctx.create_meter(OUTPUT_RECORDS_METER).increment(output as u64);

        Ok(StageReport {
            stage: stage.name().to_string(),
            kind: stage.kind(),
            input,
            output,
            outcomes,
            duration: started.elapsed(),
        })
    }
}
