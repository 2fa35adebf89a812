//! Reference kind definitions for supported declaration file formats

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of file formats that can declare a package reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Legacy packages list (packages.config)
    LegacyPackagesList,
    /// Non-SDK project file using PackageReference items
    LegacyProjectFile,
    /// SDK-style project file
    ModernProjectFile,
    /// Package manifest (.nuspec)
    PackageManifest,
    /// Directory-wide build file (Directory.Build.props and friends)
    DirectoryBuildProperties,
}

impl ReferenceKind {
    /// Returns the display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceKind::LegacyPackagesList => "packages.config",
            ReferenceKind::LegacyProjectFile => "legacy project",
            ReferenceKind::ModernProjectFile => "SDK project",
            ReferenceKind::PackageManifest => "nuspec",
            ReferenceKind::DirectoryBuildProperties => "directory build props",
        }
    }

    /// Returns true if this kind influences files nested below its directory
    pub fn is_directory_wide(&self) -> bool {
        matches!(self, ReferenceKind::DirectoryBuildProperties)
    }

    /// Returns all reference kinds
    pub fn all() -> &'static [ReferenceKind] {
        &[
            ReferenceKind::LegacyPackagesList,
            ReferenceKind::LegacyProjectFile,
            ReferenceKind::ModernProjectFile,
            ReferenceKind::PackageManifest,
            ReferenceKind::DirectoryBuildProperties,
        ]
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
