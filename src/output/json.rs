//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the aggregated result
//! - Outcomes partitioned into succeeded, failed and cancelled lists

use crate::domain::{AggregatedResult, ExecutionResult, FailureKind, ReferenceKind};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full result
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput {
    package: String,
    version: String,
    dry_run: bool,
    total: usize,
    succeeded: Vec<JsonSucceeded>,
    failed: Vec<JsonFailed>,
    cancelled: Vec<JsonCancelled>,
    /// Timing (only in verbose mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

/// JSON representation of summary counts
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    total: usize,
    succeeded: usize,
    changed: usize,
    failed: usize,
    cancelled: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSucceeded {
    reference: String,
    kind: ReferenceKind,
    changed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFailed {
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ReferenceKind>,
    failure: FailureKind,
    failing_step: String,
    detail: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonCancelled {
    reference: String,
    kind: ReferenceKind,
    pending_step: String,
}

impl JsonFormatter {
    fn to_json(&self, result: &AggregatedResult) -> JsonOutput {
        let mut output = JsonOutput {
            package: result.package_id.clone(),
            version: result.version.clone(),
            dry_run: result.dry_run,
            total: result.total(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            cancelled: Vec::new(),
            started_at: None,
            finished_at: None,
        };

        if self.verbosity == Verbosity::Verbose {
            output.started_at = Some(result.started_at);
            output.finished_at = Some(result.finished_at);
        }

        for entry in &result.results {
            let reference = entry.reference().path.display().to_string();
            match entry {
                ExecutionResult::Succeeded { kind, changed, .. } => {
                    output.succeeded.push(JsonSucceeded {
                        reference,
                        kind: *kind,
                        changed: *changed,
                    })
                }
                ExecutionResult::Failed {
                    kind,
                    failure,
                    failing_step,
                    detail,
                    ..
                } => output.failed.push(JsonFailed {
                    reference,
                    kind: *kind,
                    failure: *failure,
                    failing_step: failing_step.clone(),
                    detail: detail.clone(),
                }),
                ExecutionResult::Cancelled {
                    kind, pending_step, ..
                } => output.cancelled.push(JsonCancelled {
                    reference,
                    kind: *kind,
                    pending_step: pending_step.clone(),
                }),
            }
        }

        output
    }

    fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &AggregatedResult, writer: &mut dyn Write) -> std::io::Result<()> {
        Self::write_json(&self.to_json(result), writer)
    }

    fn format_summary(
        &self,
        result: &AggregatedResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let summary = JsonSummary {
            total: result.total(),
            succeeded: result.success_count(),
            changed: result.changed_count(),
            failed: result.failure_count(),
            cancelled: result.cancelled_count(),
        };
        Self::write_json(&summary, writer)
    }

    fn format_result(
        &self,
        result: &ExecutionResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        Self::write_json(result, writer)
    }
}
