//! Declaration file reading and writing
//!
//! This module provides:
//! - Async read/write helpers mapping IO failures to ManifestError
//! - `apply_rewrite`: read, rewrite, and write back a file in one call
//! - Dry-run mode support (no actual file modifications)

use crate::error::ManifestError;
use crate::manifest::Rewrite;
use std::path::Path;
use tokio::fs;

/// Outcome of applying a rewrite to a file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of declarations of the package that were found
    pub matched: usize,
    /// Whether the rewritten content differs from the file
    pub changed: bool,
    /// Whether the file was actually written
    pub file_modified: bool,
}

/// Read a declaration file
pub async fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ManifestError::read_error(path, e))
}

/// Write content to a declaration file
pub async fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content)
        .await
        .map_err(|e| ManifestError::write_error(path, e))
}

/// Reads `path`, applies `rewrite`, and writes the result back if it changed
///
/// The file is left untouched when nothing changed or in dry-run mode.
pub async fn apply_rewrite(
    path: &Path,
    dry_run: bool,
    rewrite: impl FnOnce(&str) -> Rewrite,
) -> Result<WriteResult, ManifestError> {
    let content = read_manifest(path).await?;
    let rewritten = rewrite(&content);

    let mut result = WriteResult {
        matched: rewritten.matched,
        changed: rewritten.changed,
        file_modified: false,
    };

    if rewritten.changed && !dry_run {
        write_manifest(path, &rewritten.content).await?;
        result.file_modified = true;
    }

    Ok(result)
}
