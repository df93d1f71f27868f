//! Storage types and traits

use crate::error::Result;
use crate::types::{RecordSet, WriteMode};
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of one table write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Destination as a URL, for logging
    pub path: String,
    /// Rows written across all files
    pub rows: usize,
    /// Parquet files written (the success marker not included)
    pub files: usize,
}

/// Storage collaborator used by both pipelines
///
/// Reads and writes are all-or-nothing from the caller's point of view:
/// any failure aborts the call and is returned unchanged.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every JSON object matching `pattern` into one record set
    ///
    /// `pattern` is relative to the store root. Records are converted
    /// against `schema`; a pattern matching nothing yields an empty set.
    async fn read(&self, pattern: &str, schema: &SchemaRef) -> Result<RecordSet>;

    /// Write `table` as Parquet under `path`
    ///
    /// Rows are laid out in `col=value` subdirectories for each of
    /// `partition_columns`, in order. An empty table still produces one
    /// (empty) data file.
    async fn write(
        &self,
        table: &RecordSet,
        path: &str,
        partition_columns: &[&str],
        mode: WriteMode,
    ) -> Result<WriteSummary>;
}
