//! Built-in update steps
//!
//! Each step is a stateless capability. File edits go through
//! `manifest::apply_rewrite` so dry-run and no-op handling stay uniform.

use crate::error::{ManifestError, StepError};
use crate::manifest::{
    apply_rewrite, get_rewriter, rewrite_imports, DirectoryBuildRewriter, NuspecRewriter,
    VersionRewriter,
};
use crate::package_manager::{command_line, restore_args, CommandRunner};
use crate::pipeline::{StepContext, StepKind, StepOutcome, UpdateStep};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default program used for restore
pub const DEFAULT_RESTORE_PROGRAM: &str = "nuget";

/// Rewrites every declaration of the target package with `rewriter`
async fn rewrite_version(
    ctx: &StepContext<'_>,
    rewriter: &dyn VersionRewriter,
) -> Result<StepOutcome, StepError> {
    let path = &ctx.reference.path;
    let target = ctx.target;

    let result = apply_rewrite(path, target.dry_run, |content| {
        rewriter.rewrite(content, &target.package_id, &target.version)
    })
    .await?;

    if result.matched == 0 {
        return Err(ManifestError::package_not_declared(&target.package_id, path).into());
    }

    debug!(
        path = %path.display(),
        format = rewriter.name(),
        matched = result.matched,
        changed = result.changed,
        "rewrote package version"
    );

    Ok(if result.changed {
        StepOutcome::Changed
    } else {
        StepOutcome::Unchanged
    })
}

/// Restores packages for a legacy package list
pub struct RestoreStep {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl RestoreStep {
    /// Create a restore step running `program` through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }
}

#[async_trait]
impl UpdateStep for RestoreStep {
    fn kind(&self) -> StepKind {
        StepKind::Restore
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
        let sources: Vec<&str> = ctx.target.sources.iter().map(String::as_str).collect();
        let (working_dir, file) = restore_location(&ctx.reference.path);
        let args = restore_args(file, &sources);

        if ctx.target.dry_run {
            debug!(command = %command_line(&self.program, &args), "dry run, skipping restore");
            return Ok(StepOutcome::Skipped);
        }

        let output = self
            .runner
            .run(&self.program, &args, working_dir)
            .await
            .map_err(|e| StepError::CommandSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            return Err(StepError::command_failed(output.command, output.code, detail));
        }

        debug!(command = %output.command, "restore completed");
        Ok(StepOutcome::Unchanged)
    }
}

/// Restore runs in the file's directory and names the file relative to it
fn restore_location(path: &Path) -> (&Path, &Path) {
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) if !dir.as_os_str().is_empty() => (dir, Path::new(name)),
        _ => (Path::new("."), path),
    }
}

/// Rewrites the reference version in packages.config or a project file
pub struct RewriteReferenceStep;

#[async_trait]
impl UpdateStep for RewriteReferenceStep {
    fn kind(&self) -> StepKind {
        StepKind::RewriteReference
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
        let rewriter = get_rewriter(ctx.kind);
        rewrite_version(ctx, rewriter.as_ref()).await
    }
}

/// Guards `$(VSToolsPath)` imports of a legacy project file
pub struct RewriteImportsStep;

#[async_trait]
impl UpdateStep for RewriteImportsStep {
    fn kind(&self) -> StepKind {
        StepKind::RewriteImports
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
        let path = &ctx.reference.path;
        let result = apply_rewrite(path, ctx.target.dry_run, rewrite_imports).await?;

        debug!(path = %path.display(), fixed = result.matched, "checked project imports");
        Ok(if result.changed {
            StepOutcome::Changed
        } else {
            StepOutcome::Unchanged
        })
    }
}

/// Rewrites a dependency version in a .nuspec file
pub struct RewriteManifestStep;

#[async_trait]
impl UpdateStep for RewriteManifestStep {
    fn kind(&self) -> StepKind {
        StepKind::RewriteManifest
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
        rewrite_version(ctx, &NuspecRewriter).await
    }
}

/// Rewrites a version in a directory-wide build file
pub struct RewriteDirectoryPropertyStep;

#[async_trait]
impl UpdateStep for RewriteDirectoryPropertyStep {
    fn kind(&self) -> StepKind {
        StepKind::RewriteDirectoryProperty
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
        rewrite_version(ctx, &DirectoryBuildRewriter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileReference, ReferenceKind};
    use crate::package_manager::CommandOutput;
    use crate::pipeline::UpdateTarget;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Mock runner recording invocations
    struct MockRunner {
        exit_code: i32,
        calls: Mutex<Vec<(String, Vec<String>, PathBuf)>>,
    }

    impl MockRunner {
        fn new(exit_code: i32) -> Self {
            Self {
                exit_code,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            working_dir: &Path,
        ) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.to_vec(),
                working_dir.to_path_buf(),
            ));
            Ok(CommandOutput {
                command: command_line(program, args),
                code: Some(self.exit_code),
                stdout: String::new(),
                stderr: if self.exit_code == 0 {
                    String::new()
                } else {
                    "Unable to find version '3.1.1' of package 'Serilog'.".to_string()
                },
            })
        }
    }

    fn target(dry_run: bool) -> UpdateTarget {
        UpdateTarget {
            package_id: "Serilog".to_string(),
            version: "3.1.1".to_string(),
            originating_source: "https://api.nuget.org/v3/index.json".to_string(),
            sources: vec!["https://api.nuget.org/v3/index.json".to_string()],
            dry_run,
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> FileReference {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        FileReference::new(path, "2.12.0")
    }

    #[tokio::test]
    async fn test_restore_runs_program_with_sources() {
        let runner = Arc::new(MockRunner::new(0));
        let step = RestoreStep::new(runner.clone(), "nuget");
        let reference = FileReference::new("/repo/App/packages.config", "2.12.0");
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::LegacyPackagesList,
            target: &target,
        };

        let outcome = step.apply(&ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "nuget");
        assert_eq!(calls[0].1[0], "restore");
        assert!(calls[0].1.contains(&"-Source".to_string()));
    }

    #[tokio::test]
    async fn test_restore_names_file_relative_to_working_dir() {
        let runner = Arc::new(MockRunner::new(0));
        let step = RestoreStep::new(runner.clone(), "nuget");
        let target = target(false);

        for path in ["req/Lib/packages.config", "packages.config"] {
            let reference = FileReference::new(path, "2.12.0");
            let ctx = StepContext {
                reference: &reference,
                kind: ReferenceKind::LegacyPackagesList,
                target: &target,
            };
            step.apply(&ctx).await.unwrap();
        }

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].1[1], "packages.config");
        assert_eq!(calls[0].2, PathBuf::from("req/Lib"));
        assert_eq!(calls[1].1[1], "packages.config");
        assert_eq!(calls[1].2, PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_restore_failure_reports_stderr() {
        let runner = Arc::new(MockRunner::new(1));
        let step = RestoreStep::new(runner, "nuget");
        let reference = FileReference::new("/repo/App/packages.config", "2.12.0");
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::LegacyPackagesList,
            target: &target,
        };

        let err = step.apply(&ctx).await.unwrap_err();
        assert!(matches!(err, StepError::CommandFailed { code: Some(1), .. }));
        assert!(err.to_string().contains("Unable to find version"));
    }

    #[tokio::test]
    async fn test_restore_skipped_in_dry_run() {
        let runner = Arc::new(MockRunner::new(0));
        let step = RestoreStep::new(runner.clone(), "nuget");
        let reference = FileReference::new("/repo/App/packages.config", "2.12.0");
        let target = target(true);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::LegacyPackagesList,
            target: &target,
        };

        assert_eq!(step.apply(&ctx).await.unwrap(), StepOutcome::Skipped);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_reference_packages_config() {
        let dir = TempDir::new().unwrap();
        let reference = write(
            &dir,
            "packages.config",
            r#"<packages><package id="Serilog" version="2.12.0" /></packages>"#,
        );
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::LegacyPackagesList,
            target: &target,
        };

        let outcome = RewriteReferenceStep.apply(&ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Changed);
        let content = fs::read_to_string(&reference.path).unwrap();
        assert!(content.contains(r#"version="3.1.1""#));
    }

    #[tokio::test]
    async fn test_rewrite_reference_not_declared() {
        let dir = TempDir::new().unwrap();
        let reference = write(
            &dir,
            "App.csproj",
            r#"<Project Sdk="Microsoft.NET.Sdk"><ItemGroup /></Project>"#,
        );
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::ModernProjectFile,
            target: &target,
        };

        let err = RewriteReferenceStep.apply(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            StepError::Manifest(ManifestError::PackageNotDeclared { .. })
        ));
    }

    #[tokio::test]
    async fn test_rewrite_imports_without_tools_imports_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let reference = write(
            &dir,
            "App.csproj",
            r#"<Project ToolsVersion="15.0"><Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" /></Project>"#,
        );
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::LegacyProjectFile,
            target: &target,
        };

        assert_eq!(
            RewriteImportsStep.apply(&ctx).await.unwrap(),
            StepOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn test_rewrite_manifest_dry_run_keeps_file() {
        let dir = TempDir::new().unwrap();
        let original = r#"<package><metadata><dependencies><dependency id="Serilog" version="2.12.0" /></dependencies></metadata></package>"#;
        let reference = write(&dir, "Lib.nuspec", original);
        let target = target(true);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::PackageManifest,
            target: &target,
        };

        assert_eq!(
            RewriteManifestStep.apply(&ctx).await.unwrap(),
            StepOutcome::Changed
        );
        assert_eq!(fs::read_to_string(&reference.path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_rewrite_directory_property() {
        let dir = TempDir::new().unwrap();
        let reference = write(
            &dir,
            "Directory.Packages.props",
            r#"<Project><ItemGroup><PackageVersion Include="Serilog" Version="2.12.0" /></ItemGroup></Project>"#,
        );
        let target = target(false);
        let ctx = StepContext {
            reference: &reference,
            kind: ReferenceKind::DirectoryBuildProperties,
            target: &target,
        };

        assert_eq!(
            RewriteDirectoryPropertyStep.apply(&ctx).await.unwrap(),
            StepOutcome::Changed
        );
        let content = fs::read_to_string(&reference.path).unwrap();
        assert!(content.contains(r#"Version="3.1.1""#));
    }
}
