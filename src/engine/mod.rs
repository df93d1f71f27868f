//! Execution engine module
//!
//! Runs the two pipelines against the storage collaborators.
//!
//! # Overview
//!
//! The engine module provides:
//! - `EtlEngine` - Reads inputs, builds the tables and writes them
//! - `JobOptions` - Patterns, output root, write mode and row policies
//! - `JobSummary` - Row counts and per-table write results
//!
//! Steps run strictly in sequence: the catalog pipeline finishes (songs,
//! then artists) before the event pipeline starts (users, time, then
//! songplays). The first failure aborts the run; tables already written
//! stay in place.

mod types;

pub use types::{JobOptions, JobSummary, TableReport};

use crate::error::Result;
use crate::pipeline::{build_catalog_tables, build_event_tables};
use crate::schema::{
    catalog_schema, event_schema, TableSpec, ARTISTS, SONGPLAYS, SONGS, TIME, USERS,
};
use crate::storage::RecordStore;
use crate::types::RecordSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// ETL engine for one run
pub struct EtlEngine {
    /// Where the source JSON is read from
    input: Arc<dyn RecordStore>,
    /// Where the tables are written
    output: Arc<dyn RecordStore>,
    /// Run options
    options: JobOptions,
    /// Statistics
    summary: JobSummary,
}

impl EtlEngine {
    /// Create a new engine
    pub fn new(input: Arc<dyn RecordStore>, output: Arc<dyn RecordStore>) -> Self {
        Self {
            input,
            output,
            options: JobOptions::default(),
            summary: JobSummary::default(),
        }
    }

    /// Set run options
    #[must_use]
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the run options
    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Get statistics
    pub fn summary(&self) -> &JobSummary {
        &self.summary
    }

    /// Run the catalog pipeline, then the event pipeline
    pub async fn run(&mut self) -> Result<JobSummary> {
        let start = Instant::now();
        self.summary = JobSummary::new();

        info!(
            catalog = %self.options.catalog_pattern,
            events = %self.options.events_pattern,
            "Starting ETL run"
        );

        self.process_catalog().await?;
        self.process_events().await?;

        self.summary.set_duration(start.elapsed().as_millis() as u64);

        info!(
            tables = self.summary.tables.len(),
            duration_ms = self.summary.duration_ms,
            "Completed ETL run"
        );

        Ok(self.summary.clone())
    }

    /// Songs and artists from the catalog
    pub async fn process_catalog(&mut self) -> Result<()> {
        let catalog = self.read_catalog().await?;
        self.summary.catalog_records = catalog.num_rows();

        let tables = build_catalog_tables(&catalog)?;

        self.write_table(&SONGS, &tables.songs).await?;
        self.write_table(&ARTISTS, &tables.artists).await?;
        Ok(())
    }

    /// Users, time and songplays from the event logs
    ///
    /// Reads the catalog again for the songplays join.
    pub async fn process_events(&mut self) -> Result<()> {
        let events = self
            .input
            .read(&self.options.events_pattern, &event_schema())
            .await?;
        self.summary.events = events.num_rows();
        if events.num_rows() == 0 {
            warn!(pattern = %self.options.events_pattern, "No event records found");
        }

        let catalog = self.read_catalog().await?;
        let tables = build_event_tables(&events, &catalog, &self.options.events)?;

        self.summary.plays = tables.plays;
        self.summary.skipped_timestamps = tables.skipped_timestamps;
        self.summary.unmatched_plays = tables.unmatched_plays;

        self.write_table(&USERS, &tables.users).await?;
        self.write_table(&TIME, &tables.time).await?;
        self.write_table(&SONGPLAYS, &tables.songplays).await?;
        Ok(())
    }

    async fn read_catalog(&self) -> Result<RecordSet> {
        let catalog = self
            .input
            .read(&self.options.catalog_pattern, &catalog_schema())
            .await?;
        if catalog.num_rows() == 0 {
            warn!(pattern = %self.options.catalog_pattern, "No catalog records found");
        }
        Ok(catalog)
    }

    async fn write_table(&mut self, spec: &TableSpec, table: &RecordSet) -> Result<()> {
        let path = spec.path_under(&self.options.output_root);
        let write = self
            .output
            .write(table, &path, spec.partition_by, self.options.write_mode)
            .await?;

        info!(
            table = spec.name,
            rows = write.rows,
            files = write.files,
            "Wrote table"
        );

        self.summary.add_table(spec.name, write);
        Ok(())
    }
}
