//! Storage module
//!
//! The read/write collaborator the pipelines talk to.
//!
//! # Overview
//!
//! - `RecordStore` - the two-operation contract: read a glob of JSON objects
//!   into a record set, write a record set as partitioned Parquet
//! - `ObjectStorage` - `RecordStore` over any `object_store` backend
//!   (S3, R2, GCS, Azure, local filesystem, in-memory)
//! - `GlobPattern` - segment-aware glob matching over object keys

mod glob;
mod object;
mod types;

pub use glob::GlobPattern;
pub use object::{ObjectStorage, SUCCESS_MARKER};
pub use types::{RecordStore, WriteSummary};
