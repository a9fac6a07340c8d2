use async_trait::async_trait;

use crate::errors::StageError;
use crate::observability::messages::stage::{RecordObserved, RecordWritten};
use crate::observability::messages::StructuredLog;
use crate::stage::StageContext;
use crate::traits::{Batch, Observer, Target};

/// Logs every record it reads.
pub struct LogTarget;

#[async_trait]
impl Target for LogTarget {
    async fn write(&self, ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError> {
        for record in batch.next_records(&[])? {
            RecordWritten {
                stage: ctx.instance_name(),
                record_id: &record.qualified_id(),
                value: record.value(),
            }
            .log();
        }
        Ok(())
    }
}

/// Drains its input and discards it.
pub struct NullTarget;

#[async_trait]
impl Target for NullTarget {
    async fn write(&self, _ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError> {
        batch.next_records(&[])?;
        Ok(())
    }
}

pub const OBSERVED_RECORDS_COUNTER: &str = "observedRecords";

/// Logs each record's trail and counts what it has seen.
pub struct LogObserver;

#[async_trait]
impl Observer for LogObserver {
    async fn observe(&self, ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError> {
        let counter = ctx.create_counter(OBSERVED_RECORDS_COUNTER);
        for record in batch.next_records(&[])? {
            let trail: Vec<&str> = record.trail().collect();
            RecordObserved {
                stage: ctx.instance_name(),
                record_id: &record.qualified_id(),
                trail: &trail,
            }
            .log();
            counter.increment(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::MemoryErrorSink;
    use crate::errors::ConsistencyError;
    use crate::backends::stub::StubRecorder;
    use crate::record::Record;
    use crate::stage::OnRecordError;
    use std::sync::Arc;

    struct Fixed {
        lanes: Vec<String>,
        records: Vec<Record>,
    }

    impl Batch for Fixed {
        fn batch_id(&self) -> Option<&str> {
            Some("0")
        }

        fn lanes(&self) -> &[String] {
            &self.lanes
        }

        fn next_records(&mut self, _lanes: &[&str]) -> Result<Vec<Record>, ConsistencyError> {
            Ok(std::mem::take(&mut self.records))
        }
    }

    fn batch(count: usize) -> Fixed {
        Fixed {
            lanes: vec!["in".into()],
            records: (0..count)
                .map(|i| Record::new("src", &i.to_string(), None).snapshot("stage"))
                .collect(),
        }
    }

    fn context(recorder: &StubRecorder) -> StageContext {
        StageContext::new(
            "stage",
            Vec::new(),
            Vec::new(),
            OnRecordError::default(),
            Some(recorder.shared()),
            Arc::new(MemoryErrorSink::new()),
        )
    }

    #[tokio::test]
    async fn test_targets_drain_their_input() {
        let ctx = context(&StubRecorder::new());

        let mut input = batch(3);
        NullTarget.write(&ctx, &mut input).await.unwrap();
        assert!(input.records.is_empty());

        let mut input = batch(2);
        LogTarget.write(&ctx, &mut input).await.unwrap();
        assert!(input.records.is_empty());
    }

    #[tokio::test]
    async fn test_log_observer_counts_records() {
        let recorder = StubRecorder::new();
        let ctx = context(&recorder);

        LogObserver.observe(&ctx, &mut batch(2)).await.unwrap();
        LogObserver.observe(&ctx, &mut batch(3)).await.unwrap();

        let metrics = recorder.snapshot();
        assert_eq!(metrics.counter(&ctx.metric_name(OBSERVED_RECORDS_COUNTER)), Some(5));
    }
}
