//! Built-in stage implementations for the local backend.

mod processors;
mod sources;
mod targets;

pub use processors::{
    ChangeTextCaseProcessor, LaneRouter, MergeLanesProcessor, RequireFieldsProcessor, TextCase,
    FIELD_MISSING, FIELD_NOT_TEXT,
};
pub use sources::{JsonListSource, TextLinesSource};
pub use targets::{LogObserver, LogTarget, NullTarget, OBSERVED_RECORDS_COUNTER};
