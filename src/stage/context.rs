// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::SystemTime;

use metrics::{Counter, Histogram, Key, Level, Metadata, Recorder};

use crate::config::consts::{ERROR_RECORDS_COUNTER, METRICS_PREFIX};
use crate::errors::{ConsistencyError, ErrorCode, RecordError};
use crate::observability::messages::{stage::RecordSentToError, StructuredLog};
use crate::record::{RawPayload, Record};
use crate::stage::{OnRecordError, StageInfo};
use crate::traits::{ErrorCause, ErrorRecord, ErrorSink};

/// Recorder a pipeline reports its stage metrics to instead of the global one.
pub type SharedRecorder = Arc<dyn Recorder + Send + Sync>;

/// Per-stage facilities: record creation, error routing, metrics and topology.
///
/// Metrics are named `stage.<instance>.<name>`. Without an injected recorder
/// they go to whatever recorder is installed globally.
pub struct StageContext {
    instance_name: String,
    output_lanes: Vec<String>,
    pipeline_info: Vec<StageInfo>,
    on_error: OnRecordError,
    recorder: Option<SharedRecorder>,
    error_sink: Arc<dyn ErrorSink>,
}

impl StageContext {
    pub fn new(
        instance_name: impl Into<String>,
        output_lanes: Vec<String>,
        pipeline_info: Vec<StageInfo>,
        on_error: OnRecordError,
        recorder: Option<SharedRecorder>,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            output_lanes,
            pipeline_info,
            on_error,
            recorder,
            error_sink,
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn on_error(&self) -> OnRecordError {
        self.on_error
    }

    /// Create a record owned by this stage.
    pub fn create_record(&self, source_id: &str) -> Result<Record, ConsistencyError> {
        self.new_record(source_id, None)
    }

    /// Create a record that keeps the raw bytes it was parsed from.
    pub fn create_record_with_raw(
        &self,
        source_id: &str,
        raw: impl Into<Arc<[u8]>>,
        raw_mime: &str,
    ) -> Result<Record, ConsistencyError> {
        self.new_record(source_id, Some(RawPayload::new(raw, raw_mime)))
    }

    fn new_record(&self, source_id: &str, raw: Option<RawPayload>) -> Result<Record, ConsistencyError> {
        if source_id.is_empty() {
            return Err(ConsistencyError::EmptySourceId(self.instance_name.clone()));
        }
        Ok(Record::new(&self.instance_name, source_id, raw))
    }

    /// Send a record to the error sink with the declared error it caused.
    pub fn to_error(&self, record: Record, error: RecordError) {
        self.emit_error(record, ErrorCause::Declared(error));
    }

    /// Send a record to the error sink with a free-form message.
    pub fn to_error_message(&self, record: Record, message: impl Into<String>) {
        self.emit_error(record, ErrorCause::Message(message.into()));
    }

    /// Send a record to the error sink with an error code and template arguments.
    pub fn to_error_id(&self, record: Record, code: &dyn ErrorCode, args: &[&dyn Display]) {
        self.emit_error(
            record,
            ErrorCause::Coded {
                code: code.code().to_string(),
                message: code.message(args),
            },
        );
    }

    fn emit_error(&self, record: Record, cause: ErrorCause) {
        RecordSentToError {
            stage: &self.instance_name,
            record_id: record.source_id(),
            cause: &cause,
        }
        .log();

        self.create_counter(ERROR_RECORDS_COUNTER).increment(1);

        self.error_sink.accept(ErrorRecord {
            stage: self.instance_name.clone(),
            record,
            cause,
            failed_at: SystemTime::now(),
        });
    }

    /// Histogram of durations in seconds.
    pub fn create_timer(&self, name: &str) -> Histogram {
        let name = self.metric_name(name);
        match &self.recorder {
            Some(recorder) => recorder.register_histogram(&Key::from_name(name), &metadata()),
            None => metrics::histogram!(name),
        }
    }

    /// Counter of events, for rates computed by the exporter.
    pub fn create_meter(&self, name: &str) -> Counter {
        self.create_counter(name)
    }

    pub fn create_counter(&self, name: &str) -> Counter {
        let name = self.metric_name(name);
        match &self.recorder {
            Some(recorder) => recorder.register_counter(&Key::from_name(name), &metadata()),
            None => metrics::counter!(name),
        }
    }

    /// Fully qualified metric name: `stage.<instance>.<name>`.
    pub fn metric_name(&self, name: &str) -> String {
        format!("{}.{}.{}", METRICS_PREFIX, self.instance_name, name)
    }

    pub fn output_lanes(&self) -> &[String] {
        &self.output_lanes
    }

    /// Descriptors of the stages upstream of this one, in execution order.
    pub fn pipeline_info(&self) -> &[StageInfo] {
        &self.pipeline_info
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("instance_name", &self.instance_name)
            .field("output_lanes", &self.output_lanes)
            .field("upstream_count", &self.pipeline_info.len())
            .field("on_error", &self.on_error)
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::MemoryErrorSink;
    use crate::backends::stub::StubRecorder;
    use crate::errors::ErrorId;
    use crate::stage::StageKind;

    const BAD_VALUE: ErrorId = ErrorId::new("BAD_VALUE", "value '{}' rejected");

    fn context(sink: Arc<MemoryErrorSink>) -> StageContext {
        context_with(sink, &StubRecorder::new())
    }

    fn context_with(sink: Arc<MemoryErrorSink>, recorder: &StubRecorder) -> StageContext {
        StageContext::new(
            "parser",
            vec!["out".to_string()],
            vec![StageInfo::new("src", StageKind::Source, Vec::<String>::new(), ["raw"])],
            OnRecordError::ToError,
            Some(recorder.shared()),
            sink,
        )
    }

    #[test]
    fn test_create_record_stamps_identity() {
        let ctx = context(Arc::new(MemoryErrorSink::new()));
        let record = ctx.create_record("line:4").unwrap();

        assert_eq!(record.stage_creator(), "parser");
        assert_eq!(record.source_id(), "line:4");
        assert!(record.raw().is_none());

        let raw = ctx
            .create_record_with_raw("line:5", b"a,b".to_vec(), "text/csv")
            .unwrap();
        assert_eq!(raw.raw().unwrap().mime(), "text/csv");
    }

    #[test]
    fn test_create_record_rejects_empty_source_id() {
        let ctx = context(Arc::new(MemoryErrorSink::new()));
        assert_eq!(
            ctx.create_record("").unwrap_err(),
            ConsistencyError::EmptySourceId("parser".into())
        );
        assert!(ctx.create_record_with_raw("", Vec::<u8>::new(), "text/plain").is_err());
    }

    #[test]
    fn test_to_error_variants_reach_sink() {
        let sink = Arc::new(MemoryErrorSink::new());
        let recorder = StubRecorder::new();
        let ctx = context_with(sink.clone(), &recorder);
        let record = ctx.create_record("r1").unwrap();

        ctx.to_error(record.clone(), RecordError::new(&BAD_VALUE, &[&"x"]));
        ctx.to_error_message(record.clone(), "unparseable");
        ctx.to_error_id(record, &BAD_VALUE, &[&42]);

        let errors = sink.errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].error_code(), Some("BAD_VALUE"));
        assert_eq!(errors[1].cause, ErrorCause::Message("unparseable".into()));
        assert_eq!(errors[2].cause.to_string(), "BAD_VALUE: value '42' rejected");
        assert!(errors.iter().all(|e| e.stage == "parser"));
        assert_eq!(recorder.snapshot().counter("stage.parser.errorRecords"), Some(3));
    }

    #[test]
    fn test_metrics_are_namespaced_and_shared() {
        let recorder = StubRecorder::new();
        let ctx = context_with(Arc::new(MemoryErrorSink::new()), &recorder);
        ctx.create_counter("rows").increment(1);
        ctx.create_counter("rows").increment(2);
        ctx.create_meter("rows").increment(1);
        ctx.create_timer("latency").record(0.25);

        let metrics = recorder.snapshot();
        assert_eq!(metrics.counter("stage.parser.rows"), Some(4));
        assert_eq!(metrics.histogram("stage.parser.latency"), Some(&[0.25][..]));
        assert_eq!(metrics.counter("stage.parser.latency"), None);
    }

    #[test]
    fn test_same_name_under_two_kinds_does_not_clash() {
        let recorder = StubRecorder::new();
        let ctx = context_with(Arc::new(MemoryErrorSink::new()), &recorder);
        ctx.create_timer(ERROR_RECORDS_COUNTER).record(1.0);

        let record = ctx.create_record("r1").unwrap();
        ctx.to_error_message(record, "late");

        let metrics = recorder.snapshot();
        assert_eq!(metrics.counter("stage.parser.errorRecords"), Some(1));
        assert_eq!(metrics.histogram("stage.parser.errorRecords"), Some(&[1.0][..]));
    }

    #[test]
    fn test_topology_introspection() {
        let ctx = context(Arc::new(MemoryErrorSink::new()));
        assert_eq!(ctx.output_lanes(), &["out".to_string()]);
        assert_eq!(ctx.pipeline_info()[0].instance_name(), "src");
    }
}
