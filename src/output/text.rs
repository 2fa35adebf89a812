//! Text output formatter for human-readable display
//!
//! This module provides:
//! - One line per reference with its outcome, aligned by path
//! - Failure detail and the failing step
//! - Summary with per-kind breakdown in verbose mode

use crate::domain::{AggregatedResult, ExecutionResult, ReferenceKind};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            if self.color {
                format!("{} ", "(dry-run)".cyan())
            } else {
                "(dry-run) ".to_string()
            }
        } else {
            String::new()
        }
    }

    fn kind_label(kind: Option<ReferenceKind>) -> String {
        kind.map(|k| k.display_name().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Calculate the maximum path length for alignment
    fn max_path_length(results: &[ExecutionResult]) -> usize {
        results
            .iter()
            .map(|r| r.reference().path.display().to_string().len())
            .max()
            .unwrap_or(0)
    }

    fn write_line(
        &self,
        result: &ExecutionResult,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let reference = result.reference();
        let path = format!("{:width$}", reference.path.display().to_string(), width = width);
        let kind = format!("[{}]", Self::kind_label(result.kind()));

        match result {
            ExecutionResult::Succeeded { changed, .. } => {
                let status = if *changed { "updated" } else { "unchanged" };
                if self.color {
                    let marker = if *changed {
                        "✓".green().to_string()
                    } else {
                        "·".dimmed().to_string()
                    };
                    writeln!(
                        writer,
                        "  {} {} {} {}",
                        marker,
                        path,
                        kind.dimmed(),
                        status
                    )
                } else {
                    writeln!(writer, "  ok {} {} {}", path, kind, status)
                }
            }
            ExecutionResult::Failed {
                failing_step,
                detail,
                ..
            } => {
                if self.color {
                    writeln!(
                        writer,
                        "  {} {} {} failed at {}: {}",
                        "✗".red(),
                        path.bold(),
                        kind.dimmed(),
                        failing_step.red(),
                        detail
                    )
                } else {
                    writeln!(
                        writer,
                        "  FAILED {} {} failed at {}: {}",
                        path, kind, failing_step, detail
                    )
                }
            }
            ExecutionResult::Cancelled { pending_step, .. } => {
                if self.color {
                    writeln!(
                        writer,
                        "  {} {} {} cancelled before {}",
                        "-".yellow(),
                        path,
                        kind.dimmed(),
                        pending_step.yellow()
                    )
                } else {
                    writeln!(
                        writer,
                        "  CANCELLED {} {} cancelled before {}",
                        path, kind, pending_step
                    )
                }
            }
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &AggregatedResult, writer: &mut dyn Write) -> std::io::Result<()> {
        // In quiet mode, only show summary
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(result, writer);
        }

        let prefix = self.dry_run_prefix();
        let title = format!("{} → {}", result.package_id, result.version);
        if self.color {
            writeln!(writer, "{}{}", prefix, title.bold())?;
        } else {
            writeln!(writer, "{}{}", prefix, title)?;
        }

        let width = Self::max_path_length(&result.results);
        for entry in &result.results {
            // Unchanged references are noise unless verbose
            if self.verbosity != Verbosity::Verbose && entry.is_success() && !entry.is_changed() {
                continue;
            }
            self.write_line(entry, width, writer)?;
        }
        writeln!(writer)?;

        self.format_summary(result, writer)
    }

    fn format_summary(
        &self,
        result: &AggregatedResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let changed = result.changed_count();
        let unchanged = result.success_count() - changed;
        let failed = result.failure_count();
        let cancelled = result.cancelled_count();

        if self.verbosity == Verbosity::Quiet {
            let mut parts = vec![format!("{} updated", changed)];
            if failed > 0 {
                parts.push(format!("{} failed", failed));
            }
            if cancelled > 0 {
                parts.push(format!("{} cancelled", cancelled));
            }
            let line = parts.join(", ");
            if self.color && (failed > 0 || cancelled > 0) {
                writeln!(writer, "{}{}", prefix, line.red())?;
            } else {
                writeln!(writer, "{}{}", prefix, line)?;
            }
            return Ok(());
        }

        if result.total() == 0 {
            if self.color {
                writeln!(writer, "{}{}", prefix, "No references to update".dimmed())?;
            } else {
                writeln!(writer, "{}No references to update", prefix)?;
            }
            return Ok(());
        }

        if self.color {
            writeln!(writer, "{}{}:", prefix, "Summary".bold())?;
            writeln!(
                writer,
                "  {} reference(s) updated, {} unchanged",
                changed.to_string().green(),
                unchanged.to_string().dimmed()
            )?;
            if failed > 0 {
                writeln!(writer, "  {} failed", failed.to_string().red())?;
            }
            if cancelled > 0 {
                writeln!(writer, "  {} cancelled", cancelled.to_string().yellow())?;
            }
        } else {
            writeln!(writer, "{}Summary:", prefix)?;
            writeln!(
                writer,
                "  {} reference(s) updated, {} unchanged",
                changed, unchanged
            )?;
            if failed > 0 {
                writeln!(writer, "  {} failed", failed)?;
            }
            if cancelled > 0 {
                writeln!(writer, "  {} cancelled", cancelled)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            writeln!(writer)?;
            writeln!(writer, "By kind:")?;
            for &kind in ReferenceKind::all() {
                let entries: Vec<_> = result.by_kind(kind).collect();
                if entries.is_empty() {
                    continue;
                }
                let ok = entries.iter().filter(|e| e.is_success()).count();
                writeln!(
                    writer,
                    "  {}: {} succeeded, {} not",
                    kind.display_name(),
                    ok,
                    entries.len() - ok
                )?;
            }
            let elapsed = result.finished_at - result.started_at;
            writeln!(writer, "Elapsed: {}ms", elapsed.num_milliseconds())?;
        }

        Ok(())
    }

    fn format_result(
        &self,
        result: &ExecutionResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let width = result.reference().path.display().to_string().len();
        self.write_line(result, width, writer)
    }
}
