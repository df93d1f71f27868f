//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, RunArgs};
use crate::config::JobConfig;
use crate::engine::{EtlEngine, JobOptions};
use crate::error::Result;
use crate::storage::ObjectStorage;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run(args) => self.run_job(args).await,
        }
    }

    /// Load configuration, with flags applied over it
    fn load_config(&self, args: &RunArgs) -> Result<JobConfig> {
        let mut config = JobConfig::load(self.cli.config.as_deref())?;
        apply_overrides(&mut config, args);
        config.validate()?;
        Ok(config)
    }

    /// Build a storage collaborator for `url`
    fn build_storage(url: &str, config: &JobConfig, for_output: bool) -> Result<ObjectStorage> {
        let credentials = config.credentials.as_ref();
        let storage = if for_output {
            ObjectStorage::parse_output(url, credentials)?
        } else {
            ObjectStorage::parse(url, credentials)?
        };
        debug!(
            url,
            scheme = storage.scheme(),
            cloud = storage.is_cloud(),
            "Opened storage"
        );
        Ok(storage
            .with_decoder_format(config.format)
            .with_parquet_config(config.parquet.writer_config()))
    }

    /// Run both pipelines and print the summary
    async fn run_job(&self, args: &RunArgs) -> Result<()> {
        let config = self.load_config(args)?;
        info!(input = %config.input, output = %config.output, "Loaded job configuration");

        let input = Arc::new(Self::build_storage(&config.input, &config, false)?);
        let output = Arc::new(Self::build_storage(&config.output, &config, true)?);

        let mut engine =
            EtlEngine::new(input, output).with_options(JobOptions::from_config(&config)?);
        let summary = engine.run().await?;

        self.output_message(&serde_json::to_value(&summary)?);
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        if self.cli.verbose {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

/// Apply the flags that were given
fn apply_overrides(config: &mut JobConfig, args: &RunArgs) {
    if let Some(input) = &args.input {
        config.input.clone_from(input);
    }
    if let Some(output) = &args.output {
        config.output.clone_from(output);
    }
    if let Some(pattern) = &args.catalog_pattern {
        config.catalog_pattern.clone_from(pattern);
    }
    if let Some(pattern) = &args.events_pattern {
        config.events_pattern.clone_from(pattern);
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(policy) = args.level_policy {
        config.users.level_policy = policy;
    }
    if let Some(policy) = args.bad_timestamp {
        config.events.bad_timestamp = policy;
    }
    if let Some(mode) = args.mode {
        config.write_mode = mode;
    }
    if let Some(minutes) = args.utc_offset_minutes {
        config.events.utc_offset_minutes = minutes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::EnvGuard;
    use crate::error::Error;
    use crate::types::{LevelPolicy, TimestampPolicy, WriteMode};
    use clap::Parser;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "songplays-etl",
            "run",
            "--input",
            "./data",
            "--output",
            "s3a://dend/analytics/",
            "--level-policy",
            "latest",
            "--bad-timestamp",
            "skip",
            "--mode",
            "error_if_exists",
            "--utc-offset-minutes",
            "-240",
        ])
        .unwrap();

        let Commands::Run(args) = &cli.command;
        assert_eq!(args.input.as_deref(), Some("./data"));
        assert_eq!(args.level_policy, Some(LevelPolicy::Latest));
        assert_eq!(args.bad_timestamp, Some(TimestampPolicy::Skip));
        assert_eq!(args.mode, Some(WriteMode::ErrorIfExists));
        assert_eq!(args.utc_offset_minutes, Some(-240));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["songplays-etl", "run", "--verbose", "-C", "dl.cfg"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.unwrap().to_str(), Some("dl.cfg"));
    }

    #[test]
    fn test_overrides_only_touch_given_flags() {
        let mut config = JobConfig::default();
        let args = RunArgs {
            output: Some("/tmp/analytics".to_string()),
            mode: Some(WriteMode::ErrorIfExists),
            ..Default::default()
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.output, "/tmp/analytics");
        assert_eq!(config.write_mode, WriteMode::ErrorIfExists);
        assert_eq!(config.input, JobConfig::default().input);
        assert_eq!(config.users.level_policy, LevelPolicy::KeepAll);
    }

    #[tokio::test]
    async fn test_run_local_directories() {
        let _env = EnvGuard::set(&[]);
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let song_dir = input.path().join("song_data/A/A/A");
        std::fs::create_dir_all(&song_dir).unwrap();
        std::fs::write(
            song_dir.join("TRAAAAW128F429D538.json"),
            r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "songplays-etl",
            "run",
            "--input",
            input.path().to_str().unwrap(),
            "--output",
            output.path().to_str().unwrap(),
        ])
        .unwrap();
        Runner::new(cli).run().await.unwrap();

        assert!(output
            .path()
            .join("songs/year=0/artist_id=ARD7TVE1187B99BFB1/part-00000.parquet")
            .exists());
        assert!(output.path().join("artists/_SUCCESS").exists());
        assert!(output.path().join("songplays/part-00000.parquet").exists());
    }

    #[tokio::test]
    async fn test_run_missing_input_directory_fails() {
        let _env = EnvGuard::set(&[]);
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("no_such_input");
        let output = root.path().join("analytics");

        let cli = Cli::try_parse_from([
            "songplays-etl",
            "run",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let err = Runner::new(cli).run().await.unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert!(!input.exists());
        assert!(!output.exists());
    }
}
