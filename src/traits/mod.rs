// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod batch;
pub mod error_sink;
pub mod stage;

pub use batch::{Batch, BatchIo, BatchMaker};
pub use error_sink::{ErrorCause, ErrorRecord, ErrorSink};
pub use stage::{Observer, Processor, RecordProcessor, Source, Target};
