//! CLI commands and argument parsing

use crate::decode::DecoderFormat;
use crate::types::{LevelPolicy, TimestampPolicy, WriteMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Songplays star-schema ETL
#[derive(Parser, Debug)]
#[command(name = "songplays-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Credentials file (INI with an [AWSkeys] section)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build songs, artists, users, time and songplays
    Run(RunArgs),
}

/// Overrides for one run; unset flags keep the configured value
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Input location (local path or cloud URL)
    /// Supports: /path, s3://bucket/path, s3a://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output location, same forms as --input
    #[arg(short, long)]
    pub output: Option<String>,

    /// Catalog records pattern, relative to the input
    #[arg(long)]
    pub catalog_pattern: Option<String>,

    /// Event logs pattern, relative to the input
    #[arg(long)]
    pub events_pattern: Option<String>,

    /// Input object format
    #[arg(long, value_enum)]
    pub format: Option<DecoderFormat>,

    /// Users seen at several levels
    #[arg(long, value_enum)]
    pub level_policy: Option<LevelPolicy>,

    /// Play events with an undecodable ts
    #[arg(long, value_enum)]
    pub bad_timestamp: Option<TimestampPolicy>,

    /// Behaviour when a table destination already holds data
    #[arg(long, value_enum)]
    pub mode: Option<WriteMode>,

    /// Calendar offset from UTC, in minutes
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,
}
