//! Per-reference execution outcome types

use super::{FileReference, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step name recorded when a reference could not be classified
pub const CLASSIFY_STEP: &str = "classify";

/// Why a unit did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The file format is not one of the known reference kinds
    UnrecognizedReferenceKind,
    /// A pipeline step reported an error
    StepFailure,
    /// The unit's task panicked
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UnrecognizedReferenceKind => write!(f, "unrecognized reference kind"),
            FailureKind::StepFailure => write!(f, "step failure"),
            FailureKind::Panicked => write!(f, "panicked"),
        }
    }
}

/// Outcome of one execution unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Every step of the pipeline completed
    Succeeded {
        reference: FileReference,
        kind: ReferenceKind,
        /// Whether any step modified the file
        changed: bool,
    },
    /// A step (or classification) failed; later steps were skipped
    Failed {
        reference: FileReference,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<ReferenceKind>,
        failure: FailureKind,
        failing_step: String,
        detail: String,
    },
    /// Cancellation was requested before `pending_step` started
    Cancelled {
        reference: FileReference,
        kind: ReferenceKind,
        pending_step: String,
    },
}

impl ExecutionResult {
    /// Creates a Succeeded result
    pub fn succeeded(reference: FileReference, kind: ReferenceKind, changed: bool) -> Self {
        ExecutionResult::Succeeded {
            reference,
            kind,
            changed,
        }
    }

    /// Creates a Failed result for a step error
    pub fn step_failed(
        reference: FileReference,
        kind: ReferenceKind,
        step: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        ExecutionResult::Failed {
            reference,
            kind: Some(kind),
            failure: FailureKind::StepFailure,
            failing_step: step.into(),
            detail: detail.into(),
        }
    }

    /// Creates a Failed result for a reference that could not be classified
    pub fn unrecognized(reference: FileReference, detail: impl Into<String>) -> Self {
        ExecutionResult::Failed {
            reference,
            kind: None,
            failure: FailureKind::UnrecognizedReferenceKind,
            failing_step: CLASSIFY_STEP.to_string(),
            detail: detail.into(),
        }
    }

    /// Creates a Failed result for a unit whose task panicked
    pub fn panicked(reference: FileReference, kind: ReferenceKind, detail: impl Into<String>) -> Self {
        ExecutionResult::Failed {
            reference,
            kind: Some(kind),
            failure: FailureKind::Panicked,
            failing_step: "unknown".to_string(),
            detail: detail.into(),
        }
    }

    /// Creates a Cancelled result
    pub fn cancelled(
        reference: FileReference,
        kind: ReferenceKind,
        pending_step: impl Into<String>,
    ) -> Self {
        ExecutionResult::Cancelled {
            reference,
            kind,
            pending_step: pending_step.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionResult::Cancelled { .. })
    }

    /// Returns true if the unit succeeded and modified its file
    pub fn is_changed(&self) -> bool {
        matches!(self, ExecutionResult::Succeeded { changed: true, .. })
    }

    /// Returns the file reference this result belongs to
    pub fn reference(&self) -> &FileReference {
        match self {
            ExecutionResult::Succeeded { reference, .. } => reference,
            ExecutionResult::Failed { reference, .. } => reference,
            ExecutionResult::Cancelled { reference, .. } => reference,
        }
    }

    /// Returns the reference kind, if classification succeeded
    pub fn kind(&self) -> Option<ReferenceKind> {
        match self {
            ExecutionResult::Succeeded { kind, .. } => Some(*kind),
            ExecutionResult::Failed { kind, .. } => *kind,
            ExecutionResult::Cancelled { kind, .. } => Some(*kind),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionResult::Succeeded {
                reference, changed, ..
            } => {
                let note = if *changed { "updated" } else { "unchanged" };
                write!(f, "{}: {}", reference.path.display(), note)
            }
            ExecutionResult::Failed {
                reference,
                failing_step,
                detail,
                ..
            } => write!(
                f,
                "{}: failed at {} ({})",
                reference.path.display(),
                failing_step,
                detail
            ),
            ExecutionResult::Cancelled {
                reference,
                pending_step,
                ..
            } => write!(
                f,
                "{}: cancelled before {}",
                reference.path.display(),
                pending_step
            ),
        }
    }
}
