//! Update pipelines
//!
//! This module provides:
//! - The step capability trait and the context steps receive
//! - Pipelines: fixed, ordered step sequences bound to one reference kind
//! - The registry mapping every reference kind to its pipeline
//! - Built-in step implementations

mod registry;
mod steps;

pub use registry::{default_pipeline, PipelineRegistry, PipelineRegistryBuilder};
pub use steps::{
    RestoreStep, RewriteDirectoryPropertyStep, RewriteImportsStep, RewriteManifestStep,
    RewriteReferenceStep, DEFAULT_RESTORE_PROGRAM,
};

use crate::domain::{FileReference, ReferenceKind, UpdateRequest};
use crate::error::StepError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Update step capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Restore packages so lock/package folders exist
    Restore,
    /// Rewrite the reference version in place
    RewriteReference,
    /// Fix import declarations in legacy project files
    RewriteImports,
    /// Rewrite a dependency version in a package manifest
    RewriteManifest,
    /// Rewrite a version in a directory-wide build file
    RewriteDirectoryProperty,
}

impl StepKind {
    /// Name recorded in execution results and logs
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Restore => "restore",
            StepKind::RewriteReference => "rewrite_reference",
            StepKind::RewriteImports => "rewrite_imports",
            StepKind::RewriteManifest => "rewrite_manifest",
            StepKind::RewriteDirectoryProperty => "rewrite_directory_property",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The resolved update every step applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    /// Package identifier
    pub package_id: String,
    /// Target version as written into files
    pub version: String,
    /// Feed the version was selected from
    pub originating_source: String,
    /// Feeds handed to restore
    pub sources: Vec<String>,
    /// Compute changes without writing files or running commands
    pub dry_run: bool,
}

impl UpdateTarget {
    /// Builds the target from an update request
    pub fn from_request(request: &UpdateRequest, dry_run: bool) -> Self {
        Self {
            package_id: request.selected_package_id.clone(),
            version: request.selected_version.to_string(),
            originating_source: request.originating_source.clone(),
            sources: request
                .restore_sources()
                .into_iter()
                .map(str::to_string)
                .collect(),
            dry_run,
        }
    }
}

/// Everything a step is invoked with
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub reference: &'a FileReference,
    pub kind: ReferenceKind,
    pub target: &'a UpdateTarget,
}

/// What a successful step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The file was (or in dry-run, would be) modified
    Changed,
    /// Nothing needed to change
    Unchanged,
    /// The step did not run (dry-run)
    Skipped,
}

impl StepOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, StepOutcome::Changed)
    }
}

/// A stateless update capability
#[async_trait]
pub trait UpdateStep: Send + Sync {
    /// The capability this step implements
    fn kind(&self) -> StepKind;

    /// Apply the step to one reference
    async fn apply(&self, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError>;
}

/// Fixed, ordered sequence of steps for one reference kind
#[derive(Clone)]
pub struct Pipeline {
    kind: ReferenceKind,
    steps: Vec<Arc<dyn UpdateStep>>,
}

impl Pipeline {
    pub(crate) fn new(kind: ReferenceKind, steps: Vec<Arc<dyn UpdateStep>>) -> Self {
        Self { kind, steps }
    }

    /// The reference kind this pipeline serves
    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Arc<dyn UpdateStep>] {
        &self.steps
    }

    /// Step capabilities in execution order
    pub fn step_kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|s| s.kind()).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("kind", &self.kind)
            .field("steps", &self.step_kinds())
            .finish()
    }
}
