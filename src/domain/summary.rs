//! Aggregated result of one update request

use super::{ExecutionResult, FileReference, ReferenceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every per-reference outcome of an update request, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Package that was updated
    pub package_id: String,
    /// Target version
    pub version: String,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// When execution started
    pub started_at: DateTime<Utc>,
    /// When the last unit finished
    pub finished_at: DateTime<Utc>,
    /// One result per input reference
    pub results: Vec<ExecutionResult>,
}

impl AggregatedResult {
    /// Creates an empty result stamped with the current time
    pub fn new(package_id: impl Into<String>, version: impl Into<String>, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            package_id: package_id.into(),
            version: version.into(),
            dry_run,
            started_at: now,
            finished_at: now,
            results: Vec::new(),
        }
    }

    /// Number of input references
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// References whose pipeline completed
    pub fn succeeded(&self) -> impl Iterator<Item = &FileReference> {
        self.results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.reference())
    }

    /// Failed results (classification or step failures)
    pub fn failed(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// Cancelled results
    pub fn cancelled(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| r.is_cancelled())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled().count()
    }

    /// Number of files actually modified
    pub fn changed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_changed()).count()
    }

    /// Returns true if every reference succeeded (trivially true when empty)
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.is_success())
    }

    /// Results for a specific reference kind
    pub fn by_kind(&self, kind: ReferenceKind) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(move |r| r.kind() == Some(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(path: &str) -> FileReference {
        FileReference::new(path, "1.0.0")
    }

    fn sample_result() -> AggregatedResult {
        let mut result = AggregatedResult::new("Serilog", "3.1.1", false);
        result.results.push(ExecutionResult::succeeded(
            reference("a/A.csproj"),
            ReferenceKind::ModernProjectFile,
            true,
        ));
        result.results.push(ExecutionResult::succeeded(
            reference("b/B.csproj"),
            ReferenceKind::ModernProjectFile,
            false,
        ));
        result.results.push(ExecutionResult::step_failed(
            reference("c/packages.config"),
            ReferenceKind::LegacyPackagesList,
            "restore",
            "boom",
        ));
        result.results.push(ExecutionResult::cancelled(
            reference("d/D.nuspec"),
            ReferenceKind::PackageManifest,
            "rewrite_manifest",
        ));
        result
    }

    #[test]
    fn test_empty_result_is_success() {
        let result = AggregatedResult::new("Serilog", "3.1.1", false);
        assert_eq!(result.total(), 0);
        assert!(result.is_success());
    }

    #[test]
    fn test_counts() {
        let result = sample_result();
        assert_eq!(result.total(), 4);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.cancelled_count(), 1);
        assert_eq!(result.changed_count(), 1);
        assert!(!result.is_success());
    }

    #[test]
    fn test_succeeded_preserves_order() {
        let result = sample_result();
        let paths: Vec<_> = result.succeeded().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                std::path::PathBuf::from("a/A.csproj"),
                std::path::PathBuf::from("b/B.csproj")
            ]
        );
    }

    #[test]
    fn test_by_kind() {
        let result = sample_result();
        assert_eq!(result.by_kind(ReferenceKind::ModernProjectFile).count(), 2);
        assert_eq!(result.by_kind(ReferenceKind::LegacyProjectFile).count(), 0);
    }
}
