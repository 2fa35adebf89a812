//! Pipeline registry
//!
//! Maps every reference kind to its pipeline. The mapping is validated
//! when the registry is built, so lookups after construction never fail.

use crate::domain::ReferenceKind;
use crate::error::ConfigError;
use crate::package_manager::CommandRunner;
use crate::pipeline::{
    Pipeline, RestoreStep, RewriteDirectoryPropertyStep, RewriteImportsStep, RewriteManifestStep,
    RewriteReferenceStep, StepKind, UpdateStep,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Standard step sequence for a reference kind
pub fn default_pipeline(kind: ReferenceKind) -> &'static [StepKind] {
    match kind {
        ReferenceKind::LegacyPackagesList => &[StepKind::Restore, StepKind::RewriteReference],
        ReferenceKind::LegacyProjectFile => {
            &[StepKind::RewriteImports, StepKind::RewriteReference]
        }
        ReferenceKind::ModernProjectFile => &[StepKind::RewriteReference],
        ReferenceKind::PackageManifest => &[StepKind::RewriteManifest],
        ReferenceKind::DirectoryBuildProperties => &[StepKind::RewriteDirectoryProperty],
    }
}

/// Immutable mapping from reference kind to pipeline
#[derive(Debug, Clone)]
pub struct PipelineRegistry {
    pipelines: HashMap<ReferenceKind, Arc<Pipeline>>,
}

impl PipelineRegistry {
    /// Builder preloaded with the standard step sequences
    pub fn builder() -> PipelineRegistryBuilder {
        let mut builder = PipelineRegistryBuilder::empty();
        for &kind in ReferenceKind::all() {
            builder = builder.with_pipeline(kind, default_pipeline(kind).to_vec());
        }
        builder
    }

    /// Registry with the standard pipelines and built-in steps
    pub fn standard(
        runner: Arc<dyn CommandRunner>,
        restore_program: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .with_step(RestoreStep::new(runner, restore_program))
            .with_step(RewriteReferenceStep)
            .with_step(RewriteImportsStep)
            .with_step(RewriteManifestStep)
            .with_step(RewriteDirectoryPropertyStep)
            .build()
    }

    /// Pipeline for `kind`
    pub fn pipeline(&self, kind: ReferenceKind) -> Arc<Pipeline> {
        // every kind is present once build() succeeded
        Arc::clone(&self.pipelines[&kind])
    }
}

/// Builder for [`PipelineRegistry`]
#[derive(Default)]
pub struct PipelineRegistryBuilder {
    layouts: HashMap<ReferenceKind, Vec<StepKind>>,
    steps: HashMap<StepKind, Arc<dyn UpdateStep>>,
}

impl PipelineRegistryBuilder {
    /// Builder with no pipelines and no steps
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a step implementation, replacing any previous one of the same kind
    pub fn with_step(self, step: impl UpdateStep + 'static) -> Self {
        self.with_shared_step(Arc::new(step))
    }

    /// Register a shared step implementation
    pub fn with_shared_step(mut self, step: Arc<dyn UpdateStep>) -> Self {
        self.steps.insert(step.kind(), step);
        self
    }

    /// Set the step sequence for a reference kind
    pub fn with_pipeline(mut self, kind: ReferenceKind, steps: Vec<StepKind>) -> Self {
        self.layouts.insert(kind, steps);
        self
    }

    /// Remove the pipeline for a reference kind
    pub fn without_pipeline(mut self, kind: ReferenceKind) -> Self {
        self.layouts.remove(&kind);
        self
    }

    /// Validate and build the registry
    ///
    /// Every reference kind needs a non-empty pipeline whose steps all
    /// have an implementation.
    pub fn build(self) -> Result<PipelineRegistry, ConfigError> {
        // layout defects are reported before missing step implementations
        for &kind in ReferenceKind::all() {
            match self.layouts.get(&kind) {
                None => return Err(ConfigError::MissingPipeline { kind }),
                Some(layout) if layout.is_empty() => {
                    return Err(ConfigError::EmptyPipeline { kind })
                }
                Some(_) => {}
            }
        }

        let mut pipelines = HashMap::new();
        for &kind in ReferenceKind::all() {
            let steps = self.layouts[&kind]
                .iter()
                .map(|step| {
                    self.steps
                        .get(step)
                        .cloned()
                        .ok_or(ConfigError::MissingStep { kind, step: *step })
                })
                .collect::<Result<Vec<_>, _>>()?;

            pipelines.insert(kind, Arc::new(Pipeline::new(kind, steps)));
        }

        Ok(PipelineRegistry { pipelines })
    }
}
