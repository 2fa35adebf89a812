//! Directory-wide build file rewriter
//!
//! Handles Directory.Build.props, Directory.Build.targets and
//! Directory.Packages.props (central package management):
//! - `<PackageReference Include|Update="X" Version="..." />`
//! - `<GlobalPackageReference Include="X" Version="..." />`
//! - `<PackageVersion Include="X" Version="..." />`

use crate::manifest::markup::{plain_version, rewrite_declarations, DeclarationShape, Rewrite};
use crate::manifest::VersionRewriter;

/// File names that apply to every project below their directory
pub const DIRECTORY_BUILD_FILES: &[&str] = &[
    "Directory.Build.props",
    "Directory.Build.targets",
    "Directory.Packages.props",
];

const SHAPE: DeclarationShape = DeclarationShape {
    elements: &["PackageReference", "GlobalPackageReference", "PackageVersion"],
    id_attributes: &["Include", "Update"],
    version_attribute: "Version",
    version_child: true,
};

/// Rewriter for directory-wide build files
pub struct DirectoryBuildRewriter;

impl VersionRewriter for DirectoryBuildRewriter {
    fn name(&self) -> &'static str {
        "directory build file"
    }

    fn rewrite(&self, content: &str, package: &str, new_version: &str) -> Rewrite {
        rewrite_declarations(content, &SHAPE, package, new_version, plain_version)
    }
}
