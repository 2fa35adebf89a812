//! CLI argument parsing module for nuup

use crate::config::{parse_duration, RunnerConfig};
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Applies a resolved NuGet package update to every referencing file
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nuup",
    version,
    about = "Applies a resolved NuGet package update to every referencing file"
)]
pub struct CliArgs {
    /// Update request JSON file
    pub request: PathBuf,

    // General options
    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    // Execution options
    /// Maximum number of references updated at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Cancel the update after this long (e.g., 30s, 5m, 1h)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Program used to restore packages.config packages
    #[arg(long)]
    pub restore_program: Option<String>,

    /// TOML config file with runner defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Reject option combinations that make no sense together
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quiet && self.verbose {
            return Err(ConfigError::ConflictingOptions {
                message: "--quiet cannot be used with --verbose".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Build the runner config: defaults, then `--config`, then flags
    pub fn runner_config(&self) -> Result<RunnerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config.concurrency = Some(concurrency);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = Some(timeout);
        }
        if let Some(program) = &self.restore_program {
            config.restore_program = program.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["nuup", "request.json"]);
        assert_eq!(args.request, PathBuf::from("request.json"));
        assert!(!args.dry_run);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(!args.json);
        assert!(!args.no_color);
        assert!(args.concurrency.is_none());
        assert!(args.timeout.is_none());
        assert!(args.restore_program.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_no_color_flag() {
        let args = CliArgs::parse_from(["nuup", "r.json", "--no-color"]);
        assert!(args.no_color);
    }

    #[test]
    fn test_request_is_required() {
        assert!(CliArgs::try_parse_from(["nuup"]).is_err());
    }

    #[test]
    fn test_dry_run_short_flag() {
        let args = CliArgs::parse_from(["nuup", "r.json", "-n"]);
        assert!(args.dry_run);
    }

    #[test]
    fn test_dry_run_long_flag() {
        let args = CliArgs::parse_from(["nuup", "r.json", "--dry-run"]);
        assert!(args.dry_run);
    }

    #[test]
    fn test_quiet_flags() {
        let args = CliArgs::parse_from(["nuup", "r.json", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["nuup", "r.json", "--quiet"]);
        assert!(args.quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let args = CliArgs::parse_from(["nuup", "r.json", "-q", "--verbose"]);
        assert!(matches!(
            args.validate(),
            Err(ConfigError::ConflictingOptions { .. })
        ));
    }

    #[test]
    fn test_timeout() {
        let args = CliArgs::parse_from(["nuup", "r.json", "--timeout", "5m"]);
        assert_eq!(args.timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_timeout_invalid() {
        assert!(CliArgs::try_parse_from(["nuup", "r.json", "--timeout", "5d"]).is_err());
    }

    #[test]
    fn test_show_progress() {
        assert!(CliArgs::parse_from(["nuup", "r.json"]).show_progress());
        assert!(!CliArgs::parse_from(["nuup", "r.json", "--json"]).show_progress());
        assert!(!CliArgs::parse_from(["nuup", "r.json", "-q"]).show_progress());
    }

    #[test]
    fn test_runner_config_from_flags() {
        let args = CliArgs::parse_from([
            "nuup",
            "r.json",
            "-n",
            "--concurrency",
            "2",
            "--restore-program",
            "/usr/local/bin/nuget",
        ]);
        let config = args.runner_config().unwrap();
        assert!(config.dry_run);
        assert_eq!(config.concurrency, Some(2));
        assert_eq!(config.restore_program, "/usr/local/bin/nuget");
    }

    #[test]
    fn test_runner_config_zero_concurrency() {
        let args = CliArgs::parse_from(["nuup", "r.json", "--concurrency", "0"]);
        assert!(matches!(
            args.runner_config(),
            Err(ConfigError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nuup.toml");
        fs::write(&path, "concurrency = 8\ntimeout = \"1h\"\n").unwrap();

        let args = CliArgs::parse_from([
            "nuup",
            "r.json",
            "--config",
            path.to_str().unwrap(),
            "--concurrency",
            "3",
        ]);
        let config = args.runner_config().unwrap();
        assert_eq!(config.concurrency, Some(3));
        assert_eq!(config.timeout, Some(Duration::from_secs(3600)));
    }
}
