//! Error types for the songplays ETL job
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the ETL job
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to load configuration: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Failed to read '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to write '{path}': {message}")]
    Write { path: String, message: String },

    #[error("Destination '{path}' already exists")]
    AlreadyExists { path: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    // ============================================================================
    // Transformation Errors
    // ============================================================================
    #[error("Cannot decode ts {ts} at row {row}: {message}")]
    TimestampDecode {
        row: usize,
        ts: String,
        message: String,
    },

    #[error("Failed to decode records: {message}")]
    Decode { message: String },

    #[error("Column '{column}' not found in record set")]
    MissingColumn { column: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a read error
    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a timestamp decode error
    pub fn timestamp(row: usize, ts: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimestampDecode {
            row,
            ts: ts.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Whether this error came from the storage collaborator
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Read { .. } | Error::Write { .. } | Error::AlreadyExists { .. }
        )
    }
}

/// Result type alias for the ETL job
pub type Result<T> = std::result::Result<T, Error>;
