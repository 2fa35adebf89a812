//! Application error types using thiserror
//!
//! Error hierarchy:
//! - UpdateError: conditions fatal to a whole update request
//! - ClassifyError: a reference whose format is not recognized
//! - StepError / ManifestError: a pipeline step failed for one reference
//! - ConfigError: registry or runner configuration defects
//! - RequestError: the update request could not be loaded

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ReferenceKind;
use crate::pipeline::StepKind;

/// Errors that abort an entire update request before any step runs
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The ordering graph between references has a cycle
    #[error("cyclic reference graph between: {}", join_paths(.paths))]
    CyclicReferenceGraph { paths: Vec<PathBuf> },

    /// The coordinator was built from an invalid configuration
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Errors raised while classifying a reference
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The file matches none of the known reference kinds
    #[error("unrecognized reference kind for {path}: {reason}")]
    UnrecognizedReferenceKind { path: PathBuf, reason: String },
}

/// Errors related to reading, rewriting and writing declaration files
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the file
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the file
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file does not declare the package
    #[error("package '{package}' is not declared in {path}")]
    PackageNotDeclared { package: String, path: PathBuf },
}

/// Errors reported by a single pipeline step
#[derive(Error, Debug)]
pub enum StepError {
    /// File level failure
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The external program could not be started
    #[error("failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program exited unsuccessfully
    #[error("`{command}` exited with {}: {stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A reference kind has no registered pipeline
    #[error("no pipeline registered for {kind}")]
    MissingPipeline { kind: ReferenceKind },

    /// A pipeline has no steps
    #[error("pipeline for {kind} has no steps")]
    EmptyPipeline { kind: ReferenceKind },

    /// A pipeline names a step without an implementation
    #[error("pipeline for {kind} uses step '{step}' which has no implementation")]
    MissingStep { kind: ReferenceKind, step: StepKind },

    /// Concurrency limit must be positive
    #[error("invalid concurrency '{value}': expected a positive number")]
    InvalidConcurrency { value: usize },

    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '30s', '5m', '1h'")]
    InvalidDuration { value: String },

    /// Restore program must be set
    #[error("restore program must not be empty")]
    EmptyRestoreProgram,

    /// Config file could not be read or parsed
    #[error("invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to loading the update request
#[derive(Error, Debug)]
pub enum RequestError {
    /// Failed to read the request file
    #[error("failed to read update request {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or field values
    #[error("failed to parse update request: {message}")]
    Parse { message: String },

    /// Well-formed but unusable request
    #[error("invalid update request: {message}")]
    Invalid { message: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl ClassifyError {
    /// Creates a new UnrecognizedReferenceKind error
    pub fn unrecognized(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClassifyError::UnrecognizedReferenceKind {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new PackageNotDeclared error
    pub fn package_not_declared(package: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ManifestError::PackageNotDeclared {
            package: package.into(),
            path: path.into(),
        }
    }
}

impl StepError {
    /// Creates a new CommandFailed error
    pub fn command_failed(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        StepError::CommandFailed {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }
}

impl RequestError {
    /// Creates a new Invalid error
    pub fn invalid(message: impl Into<String>) -> Self {
        RequestError::Invalid {
            message: message.into(),
        }
    }
}
