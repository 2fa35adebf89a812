//! Declaration file classification and rewriting
//!
//! This module provides functionality to:
//! - Classify a declaration file into its reference kind
//! - Rewrite package versions in place, preserving formatting
//! - Fix tools imports in legacy project files
//! - Read and write declaration files

mod classifier;
mod directory_build;
pub mod markup;
mod nuspec;
mod packages_config;
mod project_file;
mod writer;

pub use classifier::{classify, classify_content, classify_project_content};
pub use directory_build::{DirectoryBuildRewriter, DIRECTORY_BUILD_FILES};
pub use markup::Rewrite;
pub use nuspec::NuspecRewriter;
pub use packages_config::PackagesConfigRewriter;
pub use project_file::{rewrite_imports, ProjectFileRewriter};
pub use writer::{apply_rewrite, read_manifest, write_manifest, WriteResult};

use crate::domain::ReferenceKind;

/// Trait for rewriting a package version inside a declaration file
pub trait VersionRewriter: Send + Sync {
    /// Short format name used in logs
    fn name(&self) -> &'static str;

    /// Rewrite every declaration of `package` to `new_version`
    ///
    /// `Rewrite::matched == 0` means the package is not declared.
    fn rewrite(&self, content: &str, package: &str, new_version: &str) -> Rewrite;
}

/// Get the version rewriter for the specified reference kind
pub fn get_rewriter(kind: ReferenceKind) -> Box<dyn VersionRewriter> {
    match kind {
        ReferenceKind::LegacyPackagesList => Box::new(PackagesConfigRewriter),
        ReferenceKind::LegacyProjectFile | ReferenceKind::ModernProjectFile => {
            Box::new(ProjectFileRewriter)
        }
        ReferenceKind::PackageManifest => Box::new(NuspecRewriter),
        ReferenceKind::DirectoryBuildProperties => Box::new(DirectoryBuildRewriter),
    }
}
