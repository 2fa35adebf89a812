//! .nuspec rewriter for package manifests

use crate::manifest::markup::{rewrite_declarations, DeclarationShape, Rewrite};
use crate::manifest::VersionRewriter;

const SHAPE: DeclarationShape = DeclarationShape {
    elements: &["dependency"],
    id_attributes: &["id"],
    version_attribute: "version",
    version_child: false,
};

/// Rewriter for `<dependency>` entries in .nuspec files
pub struct NuspecRewriter;

impl VersionRewriter for NuspecRewriter {
    fn name(&self) -> &'static str {
        "nuspec"
    }

    fn rewrite(&self, content: &str, package: &str, new_version: &str) -> Rewrite {
        rewrite_declarations(content, &SHAPE, package, new_version, manifest_version)
    }
}

/// Keeps an exact-match pin (`[1.0.0]`) exact; other ranges become a minimum version
fn manifest_version(old: &str, new_version: &str) -> String {
    let exact = old.starts_with('[') && old.ends_with(']') && !old.contains(',');
    if exact {
        format!("[{}]", new_version)
    } else {
        new_version.to_string()
    }
}
