//! Engine types
//!
//! Options and the run summary of the ETL engine.

use crate::config::JobConfig;
use crate::error::Result;
use crate::pipeline::EventOptions;
use crate::storage::WriteSummary;
use crate::types::WriteMode;
use serde::Serialize;

/// Options of one ETL run
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Catalog records, relative to the input store
    pub catalog_pattern: String,
    /// Event logs, relative to the input store
    pub events_pattern: String,
    /// Directory under the output store holding every table
    pub output_root: String,
    /// Write mode for every table
    pub write_mode: WriteMode,
    /// Row policies of the event pipeline
    pub events: EventOptions,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            catalog_pattern: "song_data/*/*/*/*.json".to_string(),
            events_pattern: "log_data/*/*/*.json".to_string(),
            output_root: String::new(),
            write_mode: WriteMode::default(),
            events: EventOptions::default(),
        }
    }
}

impl JobOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching a loaded job config
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        Ok(Self {
            catalog_pattern: config.catalog_pattern.clone(),
            events_pattern: config.events_pattern.clone(),
            output_root: String::new(),
            write_mode: config.write_mode,
            events: EventOptions::new(
                config.users.level_policy,
                config.events.bad_timestamp,
                config.events.utc_offset_minutes,
            )?,
        })
    }

    /// Set the catalog pattern
    #[must_use]
    pub fn with_catalog_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.catalog_pattern = pattern.into();
        self
    }

    /// Set the events pattern
    #[must_use]
    pub fn with_events_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.events_pattern = pattern.into();
        self
    }

    /// Set the output root
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<String>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Set the write mode
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Set the event options
    #[must_use]
    pub fn with_event_options(mut self, events: EventOptions) -> Self {
        self.events = events;
        self
    }
}

/// One written table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name
    pub table: String,
    #[serde(flatten)]
    pub write: WriteSummary,
}

/// Statistics from a run, printed by the CLI
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobSummary {
    /// Catalog records read
    pub catalog_records: usize,
    /// Event records read
    pub events: usize,
    /// Play events kept
    pub plays: usize,
    /// Plays dropped for an undecodable timestamp
    pub skipped_timestamps: usize,
    /// Plays without a catalog match
    pub unmatched_plays: usize,
    /// Tables in write order
    pub tables: Vec<TableReport>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl JobSummary {
    /// Create new summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written table
    pub fn add_table(&mut self, table: impl Into<String>, write: WriteSummary) {
        self.tables.push(TableReport {
            table: table.into(),
            write,
        });
    }

    /// Report of one table, if it was written
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
