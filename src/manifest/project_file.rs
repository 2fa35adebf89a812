//! Project file (.csproj/.vbproj/.fsproj) rewriters
//!
//! Handles:
//! - `<PackageReference Include="X" Version="1.0.0" />`
//! - `<PackageReference Update="X" Version="1.0.0" />`
//! - Version as a child element: `<Version>1.0.0</Version>`
//! - Import conditions for legacy projects that pull in `$(VSToolsPath)`

use crate::manifest::markup::{
    attribute_value, find_start_tags, plain_version, rewrite_declarations, set_attribute,
    DeclarationShape, Rewrite,
};
use crate::manifest::VersionRewriter;

const SHAPE: DeclarationShape = DeclarationShape {
    elements: &["PackageReference"],
    id_attributes: &["Include", "Update"],
    version_attribute: "Version",
    version_child: true,
};

/// Condition older project templates put on tools imports; it still fails
/// when the variable is set but the file is not installed
const FRAGILE_TOOLS_CONDITION: &str = "'$(VSToolsPath)' != ''";

/// Rewriter for PackageReference items in project files
pub struct ProjectFileRewriter;

impl VersionRewriter for ProjectFileRewriter {
    fn name(&self) -> &'static str {
        "project file"
    }

    fn rewrite(&self, content: &str, package: &str, new_version: &str) -> Rewrite {
        rewrite_declarations(content, &SHAPE, package, new_version, plain_version)
    }
}

/// Guards every `$(VSToolsPath)` import with an `Exists(...)` condition
///
/// Imports without a condition, or with the fragile non-empty check, get
/// `Condition="Exists('<project>')"`. Imports with any other condition are
/// left alone. `matched` counts the imports that were fixed.
pub fn rewrite_imports(content: &str) -> Rewrite {
    let mut edits = Vec::new();

    for tag in find_start_tags(content, "Import") {
        let Some((_, project)) = attribute_value(tag.text, "Project") else {
            continue;
        };
        if !project.to_ascii_lowercase().contains("$(vstoolspath)") {
            continue;
        }

        let needs_fix = match attribute_value(tag.text, "Condition") {
            None => true,
            Some((_, condition)) => {
                normalize_condition(condition) == normalize_condition(FRAGILE_TOOLS_CONDITION)
            }
        };
        if needs_fix {
            let condition = format!("Exists('{}')", project);
            edits.push((tag.range.clone(), set_attribute(tag.text, "Condition", &condition)));
        }
    }

    let matched = edits.len();
    let mut result = content.to_string();
    for (range, replacement) in edits.into_iter().rev() {
        result.replace_range(range, &replacement);
    }

    Rewrite {
        changed: matched > 0,
        content: result,
        matched,
    }
}

fn normalize_condition(condition: &str) -> String {
    condition
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}
