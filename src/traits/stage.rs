// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::StageError;
use crate::record::Record;
use crate::stage::StageContext;
use crate::traits::{Batch, BatchIo, BatchMaker};

/// Produces the records of each batch.
#[async_trait]
pub trait Source: Send + Sync {
    /// Add up to `max_batch_size` records and return the offset to resume from.
    ///
    /// `None` means the source is exhausted; records added in the same call are
    /// still processed.
    async fn produce(
        &self,
        ctx: &StageContext,
        last_offset: Option<&str>,
        max_batch_size: usize,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<Option<String>, StageError>;
}

/// Batch-at-a-time transform with full control over its lanes.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(
        &self,
        ctx: &StageContext,
        batch: &mut dyn BatchIo,
    ) -> Result<(), StageError>;
}

/// Record-at-a-time transform; the engine applies the stage's on-error policy.
///
/// Returning [`StageError::OnRecord`] marks only `record` as bad. Any other
/// error aborts the batch regardless of policy.
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    async fn process_record(
        &self,
        ctx: &StageContext,
        record: &Record,
        batch_maker: &mut dyn BatchMaker,
    ) -> Result<(), StageError>;
}

/// Terminal stage that writes records out of the pipeline.
#[async_trait]
pub trait Target: Send + Sync {
    async fn write(&self, ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError>;
}

/// Read-only stage that inspects lanes without consuming them.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn observe(&self, ctx: &StageContext, batch: &mut dyn Batch) -> Result<(), StageError>;
}
