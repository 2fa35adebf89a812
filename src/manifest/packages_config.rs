//! packages.config rewriter for legacy package lists
//!
//! Handles:
//! - `<package id="X" version="1.0.0" targetFramework="net48" />`
//! - Attribute order and quoting as written

use crate::manifest::markup::{plain_version, rewrite_declarations, DeclarationShape, Rewrite};
use crate::manifest::VersionRewriter;

const SHAPE: DeclarationShape = DeclarationShape {
    elements: &["package"],
    id_attributes: &["id"],
    version_attribute: "version",
    version_child: false,
};

/// Rewriter for packages.config files
pub struct PackagesConfigRewriter;

impl VersionRewriter for PackagesConfigRewriter {
    fn name(&self) -> &'static str {
        "packages.config"
    }

    fn rewrite(&self, content: &str, package: &str, new_version: &str) -> Rewrite {
        rewrite_declarations(content, &SHAPE, package, new_version, plain_version)
    }
}
