//! CLI module
//!
//! Command-line interface for running the ETL job.
//!
//! # Commands
//!
//! - `run` - Build every table from the input and write it to the output

mod commands;
mod runner;

pub use commands::{Cli, Commands, RunArgs};
pub use runner::Runner;
