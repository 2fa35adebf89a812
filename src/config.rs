//! Runner configuration
//!
//! Layered from lowest to highest precedence: built-in defaults, an optional
//! TOML file, then command line flags (applied by the CLI layer).

use crate::error::ConfigError;
use crate::pipeline::DEFAULT_RESTORE_PROGRAM;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Parse duration string in format: Ns (seconds), Nm (minutes), Nh (hours)
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: s.to_string(),
    };

    let trimmed = s.trim();
    let (num_str, unit_secs) = if let Some(n) = trimmed.strip_suffix('s') {
        (n, 1)
    } else if let Some(n) = trimmed.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = trimmed.strip_suffix('h') {
        (n, 60 * 60)
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    if num == 0 {
        return Err(invalid());
    }

    num.checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Settings that control how an update request is executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of units running at once (`None` = unbounded)
    pub concurrency: Option<usize>,
    /// Program used for package restore
    pub restore_program: String,
    /// Compute changes without writing files or running commands
    pub dry_run: bool,
    /// Cancel the run after this long
    pub timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            restore_program: DEFAULT_RESTORE_PROGRAM.to_string(),
            dry_run: false,
            timeout: None,
        }
    }
}

/// On-disk representation of the config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    concurrency: Option<usize>,
    restore_program: Option<String>,
    dry_run: Option<bool>,
    timeout: Option<String>,
}

impl RunnerConfig {
    /// Defaults overlaid with the TOML config at `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::default().merge_toml(&content, path)
    }

    /// Overlay settings from TOML `content`; `origin` is used in errors
    pub fn merge_toml(mut self, content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::ConfigFile {
            path: origin.to_path_buf(),
            message: e.message().to_string(),
        })?;

        if let Some(concurrency) = file.concurrency {
            self.concurrency = Some(concurrency);
        }
        if let Some(program) = file.restore_program {
            self.restore_program = program;
        }
        if let Some(dry_run) = file.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(timeout) = file.timeout {
            self.timeout = Some(parse_duration(&timeout)?);
        }

        self.validate()?;
        Ok(self)
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(0) = self.concurrency {
            return Err(ConfigError::InvalidConcurrency { value: 0 });
        }
        if self.restore_program.trim().is_empty() {
            return Err(ConfigError::EmptyRestoreProgram);
        }
        Ok(())
    }
}
