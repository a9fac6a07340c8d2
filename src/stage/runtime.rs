// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::stage::{ErrorPolicyRunner, OnRecordError, StageContext};
use crate::traits::{Observer, Processor, RecordProcessor, Source, Target};

/// Role a stage plays in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Source,
    Processor,
    Target,
    Observer,
}

/// How a stage's lane view treats the shared lanes.
///
/// * `Transform` - input lanes are drained, output is flushed back
/// * `Observe` - input lanes are copied, nothing is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneMode {
    Transform,
    Observe,
}

/// Descriptor of one stage instance: its name, kind and lane wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInfo {
    instance_name: String,
    kind: StageKind,
    input_lanes: Vec<String>,
    output_lanes: Vec<String>,
}

impl StageInfo {
    pub fn new<I, O>(instance_name: impl Into<String>, kind: StageKind, input_lanes: I, output_lanes: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            instance_name: instance_name.into(),
            kind,
            input_lanes: input_lanes.into_iter().map(Into::into).collect(),
            output_lanes: output_lanes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn input_lanes(&self) -> &[String] {
        &self.input_lanes
    }

    pub fn output_lanes(&self) -> &[String] {
        &self.output_lanes
    }
}

/// The stage logic behind a runtime, tagged by how the engine invokes it.
#[derive(Clone)]
pub enum StageImpl {
    Source(Arc<dyn Source>),
    Processor(Arc<dyn Processor>),
    /// Invoked through the error policy runner, one record at a time
    RecordProcessor(Arc<dyn RecordProcessor>),
    Target(Arc<dyn Target>),
    Observer(Arc<dyn Observer>),
}

impl StageImpl {
    pub fn kind(&self) -> StageKind {
        match self {
            StageImpl::Source(_) => StageKind::Source,
            StageImpl::Processor(_) | StageImpl::RecordProcessor(_) => StageKind::Processor,
            StageImpl::Target(_) => StageKind::Target,
            StageImpl::Observer(_) => StageKind::Observer,
        }
    }
}

impl fmt::Debug for StageImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            StageImpl::Source(_) => "Source",
            StageImpl::Processor(_) => "Processor",
            StageImpl::RecordProcessor(_) => "RecordProcessor",
            StageImpl::Target(_) => "Target",
            StageImpl::Observer(_) => "Observer",
        };
        f.debug_tuple("StageImpl").field(&variant).finish()
    }
}

/// Everything needed to place one stage into a pipeline.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub info: StageInfo,
    pub implementation: StageImpl,
    pub on_error: OnRecordError,
}

impl StageDefinition {
    pub fn new(info: StageInfo, implementation: StageImpl) -> Self {
        Self {
            info,
            implementation,
            on_error: OnRecordError::default(),
        }
    }

    pub fn on_error(mut self, policy: OnRecordError) -> Self {
        self.on_error = policy;
        self
    }
}

/// One configured stage instance inside a built pipeline.
#[derive(Debug)]
pub struct StageRuntime {
    info: StageInfo,
    implementation: StageImpl,
    context: StageContext,
    error_policy: ErrorPolicyRunner,
}

impl StageRuntime {
    pub fn new(info: StageInfo, implementation: StageImpl, context: StageContext) -> Self {
        let error_policy = ErrorPolicyRunner::new(context.on_error());
        Self {
            info,
            implementation,
            context,
            error_policy,
        }
    }

    pub fn name(&self) -> &str {
        self.info.instance_name()
    }

    pub fn info(&self) -> &StageInfo {
        &self.info
    }

    pub fn kind(&self) -> StageKind {
        self.info.kind()
    }

    pub fn mode(&self) -> LaneMode {
        match self.info.kind() {
            StageKind::Observer => LaneMode::Observe,
            _ => LaneMode::Transform,
        }
    }

    pub fn input_lanes(&self) -> &[String] {
        self.info.input_lanes()
    }

    pub fn output_lanes(&self) -> &[String] {
        self.info.output_lanes()
    }

    pub fn implementation(&self) -> &StageImpl {
        &self.implementation
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn error_policy(&self) -> &ErrorPolicyRunner {
        &self.error_policy
    }
}
