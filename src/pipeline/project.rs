//! Column projection and row selection helpers

use crate::error::{Error, Result};
use arrow::array::UInt32Array;
use arrow::compute::take;
use arrow::record_batch::RecordBatch;

/// Keep only the named columns, in the given order
pub fn project(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = columns
        .iter()
        .map(|c| schema.index_of(c).map_err(|_| Error::missing_column(*c)))
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Gather rows by index
pub fn take_rows(batch: &RecordBatch, indices: &UInt32Array) -> Result<RecordBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}
