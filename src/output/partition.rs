//! Hive-style partition splitting
//!
//! Splits a RecordBatch into one chunk per distinct combination of
//! partition column values. Partition columns are removed from the chunks
//! and encoded in the chunk directory instead: `year=2018/month=11`.

use crate::error::{Error, Result};
use arrow::array::{Array, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Directory value used for null partition keys
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Rows of one partition
#[derive(Debug, Clone)]
pub struct PartitionChunk {
    /// Relative directory, empty for unpartitioned output
    pub dir: String,
    /// Rows with the partition columns removed
    pub batch: RecordBatch,
}

/// Schema of the data files once partition columns are removed
pub fn data_schema(schema: &Schema, partition_columns: &[&str]) -> SchemaRef {
    let fields: Vec<_> = schema
        .fields()
        .iter()
        .filter(|f| !partition_columns.contains(&f.name().as_str()))
        .cloned()
        .collect();
    Arc::new(Schema::new(fields))
}

/// Build a `col=value/col=value` directory from partition key values
pub fn partition_dir(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .map(|(column, value)| {
            let value = value.map_or_else(|| DEFAULT_PARTITION.to_string(), escape_value);
            format!("{column}={value}")
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Escape characters that would break the directory layout
fn escape_value(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

/// Split a batch by the values of `partition_columns`
///
/// With no partition columns the whole batch comes back as a single chunk
/// with an empty directory. An empty batch yields no chunks when
/// partitioned.
pub fn split_by_columns(
    batch: &RecordBatch,
    partition_columns: &[&str],
) -> Result<Vec<PartitionChunk>> {
    let schema = batch.schema();
    let key_indices = partition_columns
        .iter()
        .map(|c| schema.index_of(c).map_err(|_| Error::missing_column(*c)))
        .collect::<Result<Vec<_>>>()?;

    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !key_indices.contains(i))
        .collect();
    let data = batch.project(&data_indices)?;

    if key_indices.is_empty() {
        return Ok(vec![PartitionChunk {
            dir: String::new(),
            batch: data,
        }]);
    }

    let options = FormatOptions::default();
    let formatters = key_indices
        .iter()
        .map(|&i| ArrayFormatter::try_new(batch.column(i).as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<Vec<Option<String>>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let key = key_indices
            .iter()
            .zip(&formatters)
            .map(|(&i, formatter)| {
                if batch.column(i).is_null(row) {
                    None
                } else {
                    Some(formatter.value(row).to_string())
                }
            })
            .collect();
        groups.entry(key).or_default().push(row as u32);
    }

    groups
        .into_iter()
        .map(|(key, rows)| {
            let indices = UInt32Array::from(rows);
            let columns = data
                .columns()
                .iter()
                .map(|c| take(c.as_ref(), &indices, None))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let chunk = RecordBatch::try_new(data.schema(), columns)?;

            let pairs: Vec<(&str, Option<&str>)> = partition_columns
                .iter()
                .copied()
                .zip(key.iter().map(Option::as_deref))
                .collect();

            Ok(PartitionChunk {
                dir: partition_dir(&pairs),
                batch: chunk,
            })
        })
        .collect()
}
