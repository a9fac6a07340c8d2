use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::StageError;
use crate::stage::StageContext;
use crate::traits::{BatchMaker, Source};

/// Position to resume from, as stored in the batch id.
fn parse_offset(last_offset: Option<&str>) -> Result<usize, StageError> {
    match last_offset {
        None => Ok(0),
        Some(offset) => offset
            .parse()
            .map_err(|e| StageError::fatal(anyhow::anyhow!("invalid offset '{}': {}", offset, e))),
    }
}

/// Offset for the next batch, `None` once everything has been emitted.
fn next_offset(end: usize, total: usize) -> Option<String> {
    (end < total).then(|| end.to_string())
}

fn all_lanes(ctx: &StageContext) -> Vec<&str> {
    ctx.output_lanes().iter().map(String::as_str).collect()
}

/// Emits a fixed list of JSON values, one record per value.
///
/// Source ids are the value's index in the list; the offset is the index of
/// the next value to emit.
pub struct JsonListSource {
    records: Vec<Value>,
}

impl JsonListSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Source for JsonListSource {
    async fn produce(
        &self,
        ctx: &StageContext,
        last_offset: Option<&str>,
        max_batch_size: usize,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<Option<String>, StageError> {
        let start = parse_offset(last_offset)?.min(self.records.len());
        let end = start.saturating_add(max_batch_size).min(self.records.len());
        let lanes = all_lanes(ctx);

        for (index, value) in self.records[start..end].iter().enumerate() {
            let record = ctx
                .create_record(&(start + index).to_string())?
                .with_value(value.clone());
            batch_maker.add_record(record, &lanes)?;
        }

        Ok(next_offset(end, self.records.len()))
    }
}

/// Emits each line of a block of text, keeping the line bytes as raw payload.
pub struct TextLinesSource {
    lines: Vec<String>,
}

impl TextLinesSource {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

#[async_trait]
impl Source for TextLinesSource {
    async fn produce(
        &self,
        ctx: &StageContext,
        last_offset: Option<&str>,
        max_batch_size: usize,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<Option<String>, StageError> {
        let start = parse_offset(last_offset)?.min(self.lines.len());
        let end = start.saturating_add(max_batch_size).min(self.lines.len());
        let lanes = all_lanes(ctx);

        for (index, line) in self.lines[start..end].iter().enumerate() {
            let record = ctx
                .create_record_with_raw(
                    &format!("line:{}", start + index + 1),
                    line.as_bytes().to_vec(),
                    "text/plain",
                )?
                .with_value(json!({ "line": line }));
            batch_maker.add_record(record, &lanes)?;
        }

        Ok(next_offset(end, self.lines.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::MemoryErrorSink;
    use crate::errors::ConsistencyError;
    use crate::record::Record;
    use crate::stage::OnRecordError;
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

    fn context(lanes: &[&str]) -> StageContext {
        StageContext::new(
            "src",
            lanes.iter().map(|l| l.to_string()).collect(),
            Vec::new(),
            OnRecordError::default(),
            None,
            Arc::new(MemoryErrorSink::new()),
        )
    }

    #[tokio::test]
    async fn test_json_list_source_pages_through_records() {
        let source = JsonListSource::new(vec![json!(1), json!(2), json!(3)]);
        let ctx = context(&["raw"]);

        let mut first = Collected::default();
        let offset = source.produce(&ctx, None, 2, &mut first).await.unwrap();
        assert_eq!(offset.as_deref(), Some("2"));
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[1].0.source_id(), "1");
        assert_eq!(first.records[1].0.value(), &json!(2));

        let mut second = Collected::default();
        let offset = source
            .produce(&ctx, offset.as_deref(), 2, &mut second)
            .await
            .unwrap();
        assert_eq!(offset, None);
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].0.stage_creator(), "src");
    }

    #[tokio::test]
    async fn test_sources_fan_out_to_every_output_lane() {
        let source = JsonListSource::new(vec![json!({"a": 1})]);
        let ctx = context(&["x", "y"]);
        let mut out = Collected::default();

        source.produce(&ctx, None, 10, &mut out).await.unwrap();

        assert_eq!(out.records[0].1, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_bad_offset_is_fatal() {
        let source = JsonListSource::new(vec![json!(1)]);
        let ctx = context(&["raw"]);
        let mut out = Collected::default();

        let err = source
            .produce(&ctx, Some("not-a-number"), 10, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Fatal(_)));
    }

    #[tokio::test]
    async fn test_text_lines_source_keeps_raw_bytes() {
        let source = TextLinesSource::new("alpha\nbeta\n");
        let ctx = context(&["raw"]);
        let mut out = Collected::default();

        let offset = source.produce(&ctx, None, 10, &mut out).await.unwrap();

        assert_eq!(offset, None);
        assert_eq!(out.records.len(), 2);
        let record = &out.records[1].0;
        assert_eq!(record.source_id(), "line:2");
        assert_eq!(record.raw().unwrap().bytes(), b"beta");
        assert_eq!(record.raw().unwrap().mime(), "text/plain");
        assert_eq!(record.field("line"), Some(&json!("beta")));
    }
}
