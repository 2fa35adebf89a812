//! Lifecycle notifications for an update run
//!
//! Observers are optional: the coordinator behaves identically with
//! [`NoopObserver`]. Every method has a no-op default so implementations only
//! override the events they care about.

use crate::domain::{AggregatedResult, ExecutionResult, UpdateRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives events as an update request progresses
pub trait UpdateObserver: Send + Sync {
    /// The request was classified and sorted into `stages`
    fn update_started(&self, _request: &UpdateRequest, _units: usize, _stages: usize) {}

    /// Stage `index` (zero-based) is about to run `units` units
    fn stage_started(&self, _index: usize, _units: usize) {}

    /// One reference reached its final outcome
    fn unit_finished(&self, _result: &ExecutionResult) {}

    /// All references have an outcome
    fn update_finished(&self, _summary: &AggregatedResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl UpdateObserver for NoopObserver {}

/// Observer that emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl UpdateObserver for TracingObserver {
    fn update_started(&self, request: &UpdateRequest, units: usize, stages: usize) {
        info!(
            package = %request.selected_package_id,
            version = %request.selected_version,
            source = %request.originating_source,
            units,
            stages,
            "update started"
        );
    }

    fn stage_started(&self, index: usize, units: usize) {
        debug!(stage = index, units, "stage started");
    }

    fn unit_finished(&self, result: &ExecutionResult) {
        let path = result.reference().path.display();
        match result {
            ExecutionResult::Succeeded { changed, .. } => {
                info!(path = %path, changed, "reference updated")
            }
            ExecutionResult::Failed {
                failing_step,
                detail,
                ..
            } => warn!(path = %path, step = %failing_step, detail = %detail, "reference failed"),
            ExecutionResult::Cancelled { pending_step, .. } => {
                warn!(path = %path, step = %pending_step, "reference cancelled")
            }
        }
    }

    fn update_finished(&self, summary: &AggregatedResult) {
        info!(
            package = %summary.package_id,
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            cancelled = summary.cancelled_count(),
            "update finished"
        );
    }
}

/// Fans every event out to a list of observers in order
#[derive(Default, Clone)]
pub struct Observers {
    observers: Vec<Arc<dyn UpdateObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer to the end of the list
    pub fn with(mut self, observer: impl UpdateObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl UpdateObserver for Observers {
    fn update_started(&self, request: &UpdateRequest, units: usize, stages: usize) {
        for observer in &self.observers {
            observer.update_started(request, units, stages);
        }
    }

    fn stage_started(&self, index: usize, units: usize) {
        for observer in &self.observers {
            observer.stage_started(index, units);
        }
    }

    fn unit_finished(&self, result: &ExecutionResult) {
        for observer in &self.observers {
            observer.unit_finished(result);
        }
    }

    fn update_finished(&self, summary: &AggregatedResult) {
        for observer in &self.observers {
            observer.update_finished(summary);
        }
    }
}
