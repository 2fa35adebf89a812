//! Package manager integration for restore commands
//!
//! This module provides:
//! - A runner trait for external package manager commands (mockable)
//! - The system runner that spawns real processes
//! - Restore command construction for legacy package lists

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Captured result of an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The command line that was executed
    pub command: String,
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the command exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for running package manager commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `working_dir`
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> std::io::Result<CommandOutput>;
}

/// Default runner that executes real commands
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Create a new system command runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> std::io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            command: command_line(program, args),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Arguments for restoring the packages of `file`
///
/// `nuget restore <file> -NonInteractive -Source <feed>...`
pub fn restore_args(file: &Path, sources: &[&str]) -> Vec<String> {
    let mut args = vec![
        "restore".to_string(),
        file.display().to_string(),
        "-NonInteractive".to_string(),
    ];
    for source in sources {
        args.push("-Source".to_string());
        args.push(source.to_string());
    }
    args
}

/// Joins a program and its arguments for display
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}
