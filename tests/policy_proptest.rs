use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{json, Value};

use lanewise::backends::local::{JsonListSource, MemoryErrorSink, RequireFieldsProcessor};
use lanewise::engine::{Pipeline, RunOptions};
use lanewise::errors::StageError;
use lanewise::stage::{OnRecordError, StageContext, StageDefinition, StageImpl, StageInfo, StageKind};
use lanewise::traits::{Batch, Target};

#[derive(Clone, Default)]
struct Collector {
    ids: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Target for Collector {
    async fn write(&self, _ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError> {
        let records = batch.next_records(&[])?;
        self.ids
            .lock()
            .extend(records.iter().map(|r| r.source_id().to_string()));
        Ok(())
    }
}

fn pipeline(
    records: Vec<Value>,
    policy: OnRecordError,
    batch_size: usize,
    errors: Arc<MemoryErrorSink>,
    collector: &Collector,
) -> Pipeline {
    Pipeline::builder("prop")
        .stage(StageDefinition::new(
            StageInfo::new("source", StageKind::Source, Vec::<String>::new(), ["raw"]),
            StageImpl::Source(Arc::new(JsonListSource::new(records))),
        ))
        .stage(
            StageDefinition::new(
                StageInfo::new("validate", StageKind::Processor, ["raw"], ["valid"]),
                StageImpl::RecordProcessor(Arc::new(RequireFieldsProcessor::new(vec!["id".into()]))),
            )
            .on_error(policy),
        )
        .stage(StageDefinition::new(
            StageInfo::new("sink", StageKind::Target, ["valid"], Vec::<String>::new()),
            StageImpl::Target(Arc::new(collector.clone())),
        ))
        .batch_size(batch_size)
        .error_sink(errors)
        .build()
        .expect("pipeline must build")
}

fn records(flags: &[bool]) -> Vec<Value> {
    flags
        .iter()
        .enumerate()
        .map(|(i, good)| if *good { json!({"id": i}) } else { json!({"n": i}) })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime must start")
}

proptest! {
    #[test]
    fn every_record_ends_in_exactly_one_place(
        flags in proptest::collection::vec(any::<bool>(), 0..40),
        discard in any::<bool>(),
        batch_size in 1_usize..8,
    ) {
        let policy = if discard { OnRecordError::Discard } else { OnRecordError::ToError };
        let errors = Arc::new(MemoryErrorSink::new());
        let collector = Collector::default();
        let pipeline = pipeline(records(&flags), policy, batch_size, errors.clone(), &collector);

        let report = runtime()
            .block_on(pipeline.run(RunOptions::default()))
            .expect("run must succeed");

        let good: Vec<String> = flags
            .iter()
            .enumerate()
            .filter(|(_, good)| **good)
            .map(|(i, _)| i.to_string())
            .collect();
        let bad = flags.len() - good.len();

        prop_assert_eq!(collector.ids.lock().clone(), good.clone());
        let outcomes = report.stage("validate").and_then(|s| s.outcomes).unwrap_or_default();
        prop_assert_eq!(outcomes.succeeded, good.len());
        prop_assert_eq!(outcomes.total(), flags.len());
        if discard {
            prop_assert_eq!(outcomes.discarded, bad);
            prop_assert!(errors.is_empty());
        } else {
            prop_assert_eq!(outcomes.sent_to_error, bad);
            prop_assert_eq!(errors.len(), bad);
        }
        prop_assert_eq!(report.leftover_records, 0);
    }

    #[test]
    fn batches_cover_the_source_exactly_once(
        count in 0_usize..30,
        batch_size in 1_usize..10,
    ) {
        let collector = Collector::default();
        let flags = vec![true; count];
        let pipeline = pipeline(
            records(&flags),
            OnRecordError::StopPipeline,
            batch_size,
            Arc::new(MemoryErrorSink::new()),
            &collector,
        );

        let report = runtime()
            .block_on(pipeline.run(RunOptions::default()))
            .expect("run must succeed");

        let expected_ids: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        prop_assert_eq!(collector.ids.lock().clone(), expected_ids);
        prop_assert!(report.source_exhausted);
        prop_assert_eq!(report.batches, count.div_ceil(batch_size).max(1));
    }
}
