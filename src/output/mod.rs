//! Output module
//!
//! Handles Arrow RecordBatch creation and Parquet encoding.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting JSON records to Arrow RecordBatches against a fixed schema
//! - Encoding RecordBatches as Parquet bytes
//! - Splitting a batch into Hive-style `col=value` partitions

mod convert;
mod partition;
mod writer;

pub use convert::json_to_arrow;
pub use partition::{data_schema, partition_dir, split_by_columns, PartitionChunk};
pub use writer::{decode_parquet, encode_parquet, ParquetCompression, ParquetWriterConfig};
