/// Default number of records a source may add per batch
pub const DEFAULT_BATCH_SIZE: usize = 1_000;
/// Minimum allowed batch size
pub const MIN_BATCH_SIZE: usize = 1;
/// Maximum allowed batch size - memory limit for a single traversal
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Namespace of every stage-scoped metric: `stage.<instance>.<name>`
pub const METRICS_PREFIX: &str = "stage";
/// Timer around each stage invocation
pub const BATCH_PROCESSING_TIMER: &str = "batchProcessing";
/// Meter of records a stage read
pub const INPUT_RECORDS_METER: &str = "inputRecords";
/// Meter of records a stage wrote
pub const OUTPUT_RECORDS_METER: &str = "outputRecords";
/// Counter of records handed to the error sink
pub const ERROR_RECORDS_COUNTER: &str = "errorRecords";
/// Counter of records dropped under the discard policy
pub const DISCARDED_RECORDS_COUNTER: &str = "discardedRecords";
