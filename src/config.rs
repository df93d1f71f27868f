//! Job configuration
//!
//! This module contains the settings of one ETL run and the loader that
//! layers them: built-in defaults, the `dl.cfg` credentials file, then
//! `SONGPLAYS_*` environment variables. CLI flags are applied last by the
//! runner.

use crate::decode::DecoderFormat;
use crate::error::{Error, Result};
use crate::output::{ParquetCompression, ParquetWriterConfig};
use crate::types::{LevelPolicy, TimestampPolicy, WriteMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Section of `dl.cfg` holding the storage keys
pub const CREDENTIALS_SECTION: &str = "AWSkeys";

/// Prefix of environment overrides (`SONGPLAYS_OUTPUT`, `SONGPLAYS_EVENTS__BAD_TIMESTAMP`)
pub const ENV_PREFIX: &str = "SONGPLAYS";

/// Largest accepted calendar offset, in minutes
pub const MAX_UTC_OFFSET_MINUTES: i32 = 23 * 60 + 59;

// ============================================================================
// Top-Level Job Config
// ============================================================================

/// Complete settings of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Storage URL holding the source JSON
    #[serde(default = "default_input")]
    pub input: String,

    /// Storage URL under which every table is written
    #[serde(default = "default_output")]
    pub output: String,

    /// Catalog records, relative to `input`
    #[serde(default = "default_catalog_pattern")]
    pub catalog_pattern: String,

    /// Event logs, relative to `input`
    #[serde(default = "default_events_pattern")]
    pub events_pattern: String,

    /// How input objects are decoded
    #[serde(default)]
    pub format: DecoderFormat,

    /// Write mode for every table
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Users table settings
    #[serde(default)]
    pub users: UsersConfig,

    /// Event pipeline settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Parquet output settings
    #[serde(default)]
    pub parquet: ParquetConfig,

    /// Storage keys, when a credentials file was given
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

fn default_input() -> String {
    "s3a://udacity-dend/".to_string()
}

fn default_output() -> String {
    "s3a://dend/analytics/".to_string()
}

fn default_catalog_pattern() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_events_pattern() -> String {
    "log_data/*/*/*.json".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            catalog_pattern: default_catalog_pattern(),
            events_pattern: default_events_pattern(),
            format: DecoderFormat::default(),
            write_mode: WriteMode::default(),
            users: UsersConfig::default(),
            events: EventsConfig::default(),
            parquet: ParquetConfig::default(),
            credentials: None,
        }
    }
}

// ============================================================================
// Section Configs
// ============================================================================

/// Users table settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsersConfig {
    /// What to do with users seen at several levels
    #[serde(default)]
    pub level_policy: LevelPolicy,
}

/// Event pipeline settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    /// What to do with undecodable `ts` values
    #[serde(default)]
    pub bad_timestamp: TimestampPolicy,

    /// Fixed offset from UTC for calendar decomposition
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Parquet output settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParquetConfig {
    /// Compression codec
    #[serde(default)]
    pub compression: ParquetCompression,

    /// Maximum rows per row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: default_row_group_size(),
        }
    }
}

impl ParquetConfig {
    /// Writer settings for these options
    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_compression(self.compression)
            .with_row_group_size(self.row_group_size)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Storage access keys
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key identifier
    pub access_key_id: String,
    /// Access key secret
    pub secret_access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

impl Credentials {
    /// Load the `[AWSkeys]` section of an INI file such as `dl.cfg`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "Credentials file not found: {}",
                path.display()
            )));
        }

        let sections: HashMap<String, HashMap<String, String>> = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .build()?
            .try_deserialize()?;

        Self::from_sections(&sections)
    }

    /// Pick the keys out of parsed INI sections
    ///
    /// Section and key names are matched case-insensitively.
    fn from_sections(sections: &HashMap<String, HashMap<String, String>>) -> Result<Self> {
        let section = sections
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CREDENTIALS_SECTION))
            .map(|(_, values)| values)
            .ok_or_else(|| Error::missing_field(format!("[{CREDENTIALS_SECTION}]")))?;

        let lookup = |key: &str| {
            section
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::missing_field(format!("{CREDENTIALS_SECTION}.{key}")))
        };

        Ok(Self {
            access_key_id: lookup("AWS_ACCESS_KEY_ID")?,
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY")?,
        })
    }
}

// ============================================================================
// Loading
// ============================================================================

impl JobConfig {
    /// Load defaults, then environment overrides, then credentials
    pub fn load(credentials_file: Option<&Path>) -> Result<Self> {
        let mut config: JobConfig = config::Config::builder()
            .add_source(config::Config::try_from(&JobConfig::default())?)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(path) = credentials_file {
            config.credentials = Some(Credentials::from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            return Err(Error::missing_field("input"));
        }
        if self.output.trim().is_empty() {
            return Err(Error::missing_field("output"));
        }
        if self.events.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(Error::invalid_value(
                "events.utc_offset_minutes",
                format!(
                    "{} is outside ±{MAX_UTC_OFFSET_MINUTES}",
                    self.events.utc_offset_minutes
                ),
            ));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    /// Serializes tests that read or set `SONGPLAYS_*` variables
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets environment variables for the life of the guard
    pub(crate) struct EnvGuard {
        keys: Vec<&'static str>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        pub(crate) fn set(vars: &[(&'static str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self {
                keys: vars.iter().map(|(key, _)| *key).collect(),
                _lock: lock,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.keys {
                std::env::remove_var(key);
            }
        }
    }

    fn write_cfg(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".cfg").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = JobConfig::default();
        assert_eq!(config.catalog_pattern, "song_data/*/*/*/*.json");
        assert_eq!(config.events_pattern, "log_data/*/*/*.json");
        assert_eq!(config.write_mode, WriteMode::Overwrite);
        assert_eq!(config.users.level_policy, LevelPolicy::KeepAll);
        assert_eq!(config.events.bad_timestamp, TimestampPolicy::Fail);
        assert_eq!(config.events.utc_offset_minutes, 0);
        assert!(config.credentials.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_credentials() {
        let _env = EnvGuard::set(&[]);
        let config = JobConfig::load(None).unwrap();
        assert!(config.credentials.is_none());
        assert_eq!(config.parquet.row_group_size, 1024 * 1024);
    }

    #[test]
    fn test_env_overrides_top_level_key() {
        let _env = EnvGuard::set(&[
            ("SONGPLAYS_OUTPUT", "memory://analytics"),
            ("SONGPLAYS_WRITE_MODE", "error_if_exists"),
        ]);

        let config = JobConfig::load(None).unwrap();
        assert_eq!(config.output, "memory://analytics");
        assert_eq!(config.write_mode, WriteMode::ErrorIfExists);
        assert_eq!(config.input, "s3a://udacity-dend/");
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        let _env = EnvGuard::set(&[
            ("SONGPLAYS_EVENTS__BAD_TIMESTAMP", "skip"),
            ("SONGPLAYS_EVENTS__UTC_OFFSET_MINUTES", "-240"),
            ("SONGPLAYS_USERS__LEVEL_POLICY", "latest"),
        ]);

        let config = JobConfig::load(None).unwrap();
        assert_eq!(config.events.bad_timestamp, TimestampPolicy::Skip);
        assert_eq!(config.events.utc_offset_minutes, -240);
        assert_eq!(config.users.level_policy, LevelPolicy::Latest);
    }

    #[test]
    fn test_env_then_credentials_file() {
        let _env = EnvGuard::set(&[("SONGPLAYS_OUTPUT", "/tmp/analytics")]);
        let file = write_cfg(
            "[AWSkeys]\nAWS_ACCESS_KEY_ID = AKIDEXAMPLE\nAWS_SECRET_ACCESS_KEY = wJalrXUtnFEMI\n",
        );

        let config = JobConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.output, "/tmp/analytics");
        assert_eq!(
            config.credentials.map(|c| c.access_key_id),
            Some("AKIDEXAMPLE".to_string())
        );
    }

    #[test]
    fn test_env_invalid_value_is_rejected() {
        let _env = EnvGuard::set(&[("SONGPLAYS_EVENTS__UTC_OFFSET_MINUTES", "5000")]);

        let err = JobConfig::load(None).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_credentials_from_dl_cfg() {
        let file = write_cfg(
            "[AWSkeys]\nAWS_ACCESS_KEY_ID = AKIDEXAMPLE\nAWS_SECRET_ACCESS_KEY = wJalrXUtnFEMI\n",
        );

        let credentials = Credentials::from_file(file.path()).unwrap();
        assert_eq!(credentials.access_key_id, "AKIDEXAMPLE");
        assert_eq!(credentials.secret_access_key, "wJalrXUtnFEMI");
    }

    #[test]
    fn test_credentials_missing_key() {
        let file = write_cfg("[AWSkeys]\nAWS_ACCESS_KEY_ID = AKIDEXAMPLE\n");

        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn test_credentials_missing_section() {
        let file = write_cfg("[other]\nkey = value\n");

        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("[AWSkeys]"));
    }

    #[test]
    fn test_credentials_missing_file() {
        let err = Credentials::from_file("/nonexistent/dl.cfg").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_credentials_debug_masks_secret() {
        let credentials = Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn test_validate_offset_range() {
        let mut config = JobConfig::default();
        config.events.utc_offset_minutes = -240;
        assert!(config.validate().is_ok());

        config.events.utc_offset_minutes = 24 * 60;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_validate_row_group_size() {
        let mut config = JobConfig::default();
        config.parquet.row_group_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parquet_config_to_writer() {
        let parquet = ParquetConfig {
            compression: ParquetCompression::None,
            row_group_size: 10,
        };
        let writer = parquet.writer_config();
        assert_eq!(writer.row_group_size(), 10);
        assert_eq!(writer.compression(), parquet::basic::Compression::UNCOMPRESSED);
    }
}
