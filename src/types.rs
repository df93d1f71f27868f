//! Common types used throughout the ETL job
//!
//! Write modes and the row policies shared by the pipelines, the
//! configuration layer and the CLI.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// A record set: one uniformly shaped Arrow batch
pub type RecordSet = arrow::record_batch::RecordBatch;

// ============================================================================
// Write Mode
// ============================================================================

/// What the writer does when the destination already holds data
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum WriteMode {
    /// Delete everything under the destination, then write
    #[default]
    Overwrite,
    /// Refuse to write if the destination holds any object
    ErrorIfExists,
}

// ============================================================================
// Row Policies
// ============================================================================

/// How the users table treats a user seen with several levels
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LevelPolicy {
    /// One users row per play event, levels as logged
    #[default]
    KeepAll,
    /// One row per userId, from that user's most recent event
    Latest,
}

/// What happens to a play event whose `ts` cannot be decoded
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Abort the job with a timestamp decode error
    #[default]
    Fail,
    /// Drop the event from every event-derived table
    Skip,
}
