use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{ErrorId, RecordError, StageError};
use crate::record::Record;
use crate::stage::StageContext;
use crate::traits::{BatchIo, BatchMaker, Processor, RecordProcessor};

pub const FIELD_MISSING: ErrorId = ErrorId::new("FIELD_MISSING", "field '{}' missing in record '{}'");
pub const FIELD_NOT_TEXT: ErrorId = ErrorId::new("FIELD_NOT_TEXT", "field '{}' in record '{}' is not text");

/// Passes records through unchanged when every listed field is present and
/// not null.
pub struct RequireFieldsProcessor {
    fields: Vec<String>,
}

impl RequireFieldsProcessor {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

#[async_trait]
impl RecordProcessor for RequireFieldsProcessor {
    async fn process_record(
        &self,
        _ctx: &StageContext,
        record: &Record,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<(), StageError> {
        if let Some(missing) = self.fields.iter().find(|f| record.field(f).map_or(true, Value::is_null)) {
            let id = record.source_id();
            return Err(RecordError::new(&FIELD_MISSING, &[missing, &id]).into());
        }
        batch_maker.add_record(record.clone(), &[])?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    Upper,
    Lower,
    /// First letter of every word capitalized
    Proper,
    /// Like proper, but small words after the first stay lowercase
    Title,
}

impl TextCase {
    pub fn apply(self, input: &str) -> String {
        match self {
            TextCase::Upper => input.to_uppercase(),
            TextCase::Lower => input.to_lowercase(),
            TextCase::Proper => input
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            TextCase::Title => input
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    let lower = word.to_lowercase();
                    if i == 0 || !is_small_word(&lower) {
                        capitalize(word)
                    } else {
                        lower
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

fn is_small_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "and" | "or" | "but" | "in" | "on" | "at" | "to" | "for" | "of" | "with" | "by"
    )
}

/// Rewrites one text field of each record into the configured case.
pub struct ChangeTextCaseProcessor {
    field: String,
    case: TextCase,
}

impl ChangeTextCaseProcessor {
    pub fn new(field: impl Into<String>, case: TextCase) -> Self {
        Self {
            field: field.into(),
            case,
        }
    }
}

#[async_trait]
impl RecordProcessor for ChangeTextCaseProcessor {
    async fn process_record(
        &self,
        _ctx: &StageContext,
        record: &Record,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<(), StageError> {
        let id = record.source_id();
        let text = match record.field(&self.field) {
            None => return Err(RecordError::new(&FIELD_MISSING, &[&self.field, &id]).into()),
            Some(Value::String(text)) => self.case.apply(text),
            Some(_) => return Err(RecordError::new(&FIELD_NOT_TEXT, &[&self.field, &id]).into()),
        };

        let mut output = record.clone();
        if let Value::Object(map) = output.value_mut() {
            map.insert(self.field.clone(), Value::String(text));
        }
        batch_maker.add_record(output, &[])?;
        Ok(())
    }
}

/// Sends records whose field equals a value to one lane, everything else to
/// another.
pub struct LaneRouter {
    field: String,
    value: Value,
    match_lane: String,
    default_lane: String,
}

impl LaneRouter {
    pub fn new(
        field: impl Into<String>,
        value: Value,
        match_lane: impl Into<String>,
        default_lane: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value,
            match_lane: match_lane.into(),
            default_lane: default_lane.into(),
        }
    }
}

#[async_trait]
impl RecordProcessor for LaneRouter {
    async fn process_record(
        &self,
        _ctx: &StageContext,
        record: &Record,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<(), StageError> {
        let lane = if record.field(&self.field) == Some(&self.value) {
            self.match_lane.as_str()
        } else {
            self.default_lane.as_str()
        };
        batch_maker.add_record(record.clone(), &[lane])?;
        Ok(())
    }
}

/// Batch processor that moves every record from all input lanes to its single
/// output lane, preserving lane order.
pub struct MergeLanesProcessor;

#[async_trait]
impl Processor for MergeLanesProcessor {
    async fn process(&self, _ctx: &StageContext, batch: &mut dyn BatchIo) -> Result<(), StageError> {
        for record in batch.next_records(&[])? {
            batch.add_record(record, &[])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::MemoryErrorSink;
    use crate::errors::ConsistencyError;
    use crate::stage::OnRecordError;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct Collected {
        records: Vec<(Record, Vec<String>)>,
    }

    impl BatchMaker for Collected {
        fn check_lanes(&self, _lanes: &[&str]) -> Result<(), ConsistencyError> {
            Ok(())
        }

        fn add_record(&mut self, record: Record, lanes: &[&str]) -> Result<(), ConsistencyError> {
            self.records
                .push((record, lanes.iter().map(|l| l.to_string()).collect()));
            Ok(())
        }
    }

    fn context() -> StageContext {
        StageContext::new(
            "proc",
            vec!["out".to_string()],
            Vec::new(),
            OnRecordError::default(),
            None,
            Arc::new(MemoryErrorSink::new()),
        )
    }

    fn record(value: Value) -> Record {
        Record::new("src", "r1", None).with_value(value)
    }

    fn record_error(err: StageError) -> RecordError {
        match err {
            StageError::OnRecord(err) => err,
            other => panic!("expected a record error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_case_modes() {
        assert_eq!(TextCase::Upper.apply("hello World"), "HELLO WORLD");
        assert_eq!(TextCase::Lower.apply("Hello WORLD"), "hello world");
        assert_eq!(TextCase::Proper.apply("the LORD of the rings"), "The Lord Of The Rings");
        assert_eq!(TextCase::Title.apply("the lord of the rings"), "The Lord of the Rings");
        assert_eq!(TextCase::Title.apply(""), "");
    }

    #[tokio::test]
    async fn test_require_fields_passes_complete_records() {
        let processor = RequireFieldsProcessor::new(vec!["id".into(), "name".into()]);
        let mut out = Collected::default();

        processor
            .process_record(&context(), &record(json!({"id": 1, "name": "x"})), &mut out)
            .await
            .unwrap();

        assert_eq!(out.records.len(), 1);
        assert!(out.records[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_require_fields_names_the_missing_field() {
        let processor = RequireFieldsProcessor::new(vec!["id".into(), "name".into()]);
        let mut out = Collected::default();

        let err = processor
            .process_record(&context(), &record(json!({"id": 1, "name": null})), &mut out)
            .await
            .unwrap_err();

        let err = record_error(err);
        assert_eq!(err.code(), "FIELD_MISSING");
        assert_eq!(err.message(), "field 'name' missing in record 'r1'");
        assert!(out.records.is_empty());
    }

    #[tokio::test]
    async fn test_change_text_case_rewrites_field() {
        let processor = ChangeTextCaseProcessor::new("name", TextCase::Upper);
        let mut out = Collected::default();
        let input = record(json!({"name": "ada", "id": 7}));

        processor.process_record(&context(), &input, &mut out).await.unwrap();

        assert_eq!(out.records[0].0.value(), &json!({"name": "ADA", "id": 7}));
        assert_eq!(input.field("name"), Some(&json!("ada")));
    }

    #[tokio::test]
    async fn test_change_text_case_rejects_non_text() {
        let processor = ChangeTextCaseProcessor::new("name", TextCase::Lower);
        let mut out = Collected::default();

        let err = processor
            .process_record(&context(), &record(json!({"name": 3})), &mut out)
            .await
            .unwrap_err();

        assert_eq!(record_error(err).code(), "FIELD_NOT_TEXT");
    }

    #[tokio::test]
    async fn test_lane_router_picks_lane_by_value() {
        let router = LaneRouter::new("status", json!("ok"), "good", "rest");
        let mut out = Collected::default();
        let ctx = context();

        router
            .process_record(&ctx, &record(json!({"status": "ok"})), &mut out)
            .await
            .unwrap();
        router
            .process_record(&ctx, &record(json!({"status": "late"})), &mut out)
            .await
            .unwrap();
        router.process_record(&ctx, &record(json!({})), &mut out).await.unwrap();

        let lanes: Vec<&str> = out.records.iter().map(|(_, l)| l[0].as_str()).collect();
        assert_eq!(lanes, vec!["good", "rest", "rest"]);
    }
}
