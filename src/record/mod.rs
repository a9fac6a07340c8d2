// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The record model moved through pipeline lanes.
//!
//! A [`Record`] is immutable by convention: stages receive snapshots, replace
//! the payload on their own copy, and hand the copy downstream. Payload and raw
//! bytes live behind `Arc`, so copying a record costs a few reference-count
//! increments plus the provenance trail.

use serde_json::Value;
use std::sync::Arc;

/// Raw origin bytes of a record created from a byte-oriented source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    bytes: Arc<[u8]>,
    mime: Arc<str>,
}

impl RawPayload {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<Arc<str>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// A unit of data flowing through the pipeline.
///
/// The source identifier (creating stage + source id) is fixed at creation and
/// never changes. The structured payload and the provenance trail evolve as the
/// record passes through stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    stage_creator: Arc<str>,
    source_id: Arc<str>,
    raw: Option<RawPayload>,
    value: Arc<Value>,
    trail: Vec<Arc<str>>,
}

impl Record {
    /// Create a record stamped with its creating stage and source identifier.
    ///
    /// Stage code should go through `StageContext::create_record`, which also
    /// rejects empty identifiers.
    pub(crate) fn new(stage_creator: &str, source_id: &str, raw: Option<RawPayload>) -> Self {
        Self {
            stage_creator: Arc::from(stage_creator),
            source_id: Arc::from(source_id),
            raw,
            value: Arc::new(Value::Null),
            trail: Vec::new(),
        }
    }

    /// Copy of this record tagged with the reading stage's name.
    ///
    /// The copy shares payload storage with the original; writes through
    /// [`Record::value_mut`] clone it first, so the original is never affected.
    pub fn snapshot(&self, stage_name: &str) -> Self {
        let mut trail = Vec::with_capacity(self.trail.len() + 1);
        trail.extend(self.trail.iter().cloned());
        trail.push(Arc::from(stage_name));
        Self {
            stage_creator: Arc::clone(&self.stage_creator),
            source_id: Arc::clone(&self.source_id),
            raw: self.raw.clone(),
            value: Arc::clone(&self.value),
            trail,
        }
    }

    pub fn stage_creator(&self) -> &str {
        &self.stage_creator
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Stage-qualified identifier, `<stage>::<source id>`.
    pub fn qualified_id(&self) -> String {
        format!("{}::{}", self.stage_creator, self.source_id)
    }

    pub fn raw(&self) -> Option<&RawPayload> {
        self.raw.as_ref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the payload, cloning it if another record shares it.
    pub fn value_mut(&mut self) -> &mut Value {
        Arc::make_mut(&mut self.value)
    }

    /// Replace the payload.
    pub fn set_value(&mut self, value: Value) {
        self.value = Arc::new(value);
    }

    /// Builder-style variant of [`Record::set_value`].
    pub fn with_value(mut self, value: Value) -> Self {
        self.set_value(value);
        self
    }

    /// Look up a top-level field of an object payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// Names of the stages that have read this record, oldest first.
    pub fn trail(&self) -> impl Iterator<Item = &str> {
        self.trail.iter().map(|s| s.as_ref())
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_appends_stage_and_keeps_identity() {
        let record = Record::new("source", "file.csv:1", None).with_value(json!({"a": 1}));
        let snap = record.snapshot("validate");

        assert_eq!(snap.source_id(), "file.csv:1");
        assert_eq!(snap.stage_creator(), "source");
        assert_eq!(snap.trail().collect::<Vec<_>>(), vec!["validate"]);
        assert_eq!(record.trail_len(), 0);
        assert_eq!(snap.value(), record.value());
    }

    #[test]
    fn test_snapshot_mutation_does_not_leak_to_original() {
        let record = Record::new("source", "1", None).with_value(json!({"name": "ada"}));
        let mut snap = record.snapshot("upper");
        snap.value_mut()["name"] = json!("ADA");

        assert_eq!(record.field("name"), Some(&json!("ada")));
        assert_eq!(snap.field("name"), Some(&json!("ADA")));
    }

    #[test]
    fn test_raw_payload_accessors() {
        let raw = RawPayload::new(b"hello".to_vec(), "text/plain");
        let record = Record::new("lines", "0", Some(raw));

        let raw = record.raw().unwrap();
        assert_eq!(raw.bytes(), b"hello");
        assert_eq!(raw.mime(), "text/plain");
        assert_eq!(record.qualified_id(), "lines::0");
    }
}
