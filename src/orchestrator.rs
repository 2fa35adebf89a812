//! Update orchestrator for coordinating a whole update request
//!
//! This module provides:
//! - Workflow coordination: classify → sort → run stages → aggregate
//! - One tokio task per reference, with an optional concurrency cap
//! - Failure isolation: a failing unit never affects its siblings
//! - Cooperative cancellation and timeout
//! - Dry-run mode support

use crate::config::RunnerConfig;
use crate::domain::{AggregatedResult, ClassifiedReference, ExecutionResult, UpdateRequest};
use crate::error::{ConfigError, UpdateError};
use crate::manifest::classify;
use crate::observer::{NoopObserver, UpdateObserver};
use crate::package_manager::{CommandRunner, SystemCommandRunner};
use crate::pipeline::{Pipeline, PipelineRegistry, StepContext, UpdateTarget};
use crate::sort::{DependencySorter, ExecutionPlan};
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Coordinates the execution of one update request at a time
pub struct Orchestrator {
    registry: PipelineRegistry,
    config: RunnerConfig,
    observer: Arc<dyn UpdateObserver>,
    cancellation: CancellationToken,
}

/// One reference bound to its pipeline
struct ExecutionUnit {
    classified: ClassifiedReference,
    pipeline: Arc<Pipeline>,
}

impl Orchestrator {
    /// Create an orchestrator from a validated registry
    pub fn new(registry: PipelineRegistry, config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            observer: Arc::new(NoopObserver),
            cancellation: CancellationToken::new(),
        })
    }

    /// Orchestrator with the standard pipelines, running real commands
    pub fn standard(config: RunnerConfig) -> Result<Self, ConfigError> {
        Self::with_runner(config, Arc::new(SystemCommandRunner::new()))
    }

    /// Orchestrator with the standard pipelines and a custom command runner
    pub fn with_runner(
        config: RunnerConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let registry = PipelineRegistry::standard(runner, config.restore_program.clone())?;
        Self::new(registry, config)
    }

    /// Attach an observer for lifecycle events
    pub fn with_observer(mut self, observer: impl UpdateObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that cancels the run when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Apply `request` to every reference it names
    ///
    /// Returns an error only for conditions fatal to the whole request, in
    /// which case no step has run. Per-reference failures are recorded in
    /// the returned result.
    pub async fn run(&self, request: &UpdateRequest) -> Result<AggregatedResult, UpdateError> {
        let mut summary = AggregatedResult::new(
            &request.selected_package_id,
            request.selected_version.to_string(),
            self.config.dry_run,
        );
        let total = request.references.len();
        let mut slots: Vec<Option<ExecutionResult>> = vec![None; total];

        // Step 1: Classify every reference
        let mut classified = Vec::with_capacity(total);
        let mut origins = Vec::with_capacity(total);
        for (index, reference) in request.references.iter().enumerate() {
            match classify(&reference.path).await {
                Ok(kind) => {
                    debug!(path = %reference.path.display(), kind = %kind, "classified reference");
                    classified.push(ClassifiedReference::new(reference.clone(), kind));
                    origins.push(index);
                }
                Err(e) => {
                    slots[index] = Some(ExecutionResult::unrecognized(
                        reference.clone(),
                        e.to_string(),
                    ));
                }
            }
        }

        // Step 2: Order into stages; a cycle aborts before anything runs
        let plan = DependencySorter::sort(&classified)?;

        self.observer.update_started(request, total, plan.stages.len());
        for result in slots.iter().flatten() {
            self.observer.unit_finished(result);
        }

        // Step 3: Run stages
        let token = self.cancellation.child_token();
        let timer = self.config.timeout.map(|timeout| {
            let timer_token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(?timeout, "update timed out, cancelling");
                timer_token.cancel();
            })
        });

        let target = Arc::new(UpdateTarget::from_request(request, self.config.dry_run));
        self.run_stages(&plan, classified, &origins, &mut slots, &target, &token)
            .await;

        if let Some(timer) = timer {
            timer.abort();
        }

        // Step 4: Aggregate in input order
        summary.results = slots.into_iter().flatten().collect();
        summary.finished_at = Utc::now();
        self.observer.update_finished(&summary);
        Ok(summary)
    }

    async fn run_stages(
        &self,
        plan: &ExecutionPlan,
        classified: Vec<ClassifiedReference>,
        origins: &[usize],
        slots: &mut [Option<ExecutionResult>],
        target: &Arc<UpdateTarget>,
        token: &CancellationToken,
    ) {
        let semaphore = self.config.concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut units: Vec<Option<ExecutionUnit>> = classified
            .into_iter()
            .map(|classified| {
                let pipeline = self.registry.pipeline(classified.kind);
                Some(ExecutionUnit {
                    classified,
                    pipeline,
                })
            })
            .collect();

        for (stage_index, stage) in plan.stages.iter().enumerate() {
            let stage_units: Vec<(usize, ExecutionUnit)> = stage
                .iter()
                .filter_map(|&i| units[i].take().map(|unit| (i, unit)))
                .collect();

            if token.is_cancelled() {
                debug!(stage = stage_index, "stage skipped after cancellation");
                for (i, unit) in stage_units {
                    let result = unit.not_started();
                    self.observer.unit_finished(&result);
                    slots[origins[i]] = Some(result);
                }
                continue;
            }

            self.observer.stage_started(stage_index, stage_units.len());

            let mut handles: Vec<(usize, ClassifiedReference, JoinHandle<ExecutionResult>)> =
                Vec::with_capacity(stage_units.len());
            for (i, unit) in stage_units {
                let reference = unit.classified.clone();
                let target = Arc::clone(target);
                let token = token.clone();
                let semaphore = semaphore.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    unit.run(&target, &token).await
                });
                handles.push((i, reference, handle));
            }

            // Join the whole stage before the next one starts
            for (i, reference, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        let detail = if e.is_panic() {
                            panic_message(e.into_panic())
                        } else {
                            e.to_string()
                        };
                        ExecutionResult::panicked(reference.reference, reference.kind, detail)
                    }
                };
                self.observer.unit_finished(&result);
                slots[origins[i]] = Some(result);
            }
        }
    }
}

impl ExecutionUnit {
    /// Run every step in order, stopping at the first failure
    async fn run(self, target: &UpdateTarget, token: &CancellationToken) -> ExecutionResult {
        let kind = self.classified.kind;
        let mut changed = false;

        for step in self.pipeline.steps() {
            let step_name = step.kind().name();
            if token.is_cancelled() {
                debug!(path = %self.classified.path().display(), step = step_name, "cancelled");
                return ExecutionResult::cancelled(self.classified.reference, kind, step_name);
            }

            let ctx = StepContext {
                reference: &self.classified.reference,
                kind,
                target,
            };
            match step.apply(&ctx).await {
                Ok(outcome) => {
                    debug!(path = %ctx.reference.path.display(), step = step_name, ?outcome, "step completed");
                    changed |= outcome.is_changed();
                }
                Err(e) => {
                    return ExecutionResult::step_failed(
                        self.classified.reference,
                        kind,
                        step_name,
                        e.to_string(),
                    );
                }
            }
        }

        ExecutionResult::succeeded(self.classified.reference, kind, changed)
    }

    /// Result for a unit whose stage never started
    fn not_started(self) -> ExecutionResult {
        let pending = self
            .pipeline
            .steps()
            .first()
            .map_or("none", |step| step.kind().name());
        ExecutionResult::cancelled(self.classified.reference, self.classified.kind, pending)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
