//! Reference classification
//!
//! Maps a declaration file to its reference kind:
//! - packages.config → legacy packages list
//! - *.nuspec → package manifest
//! - Directory.Build.props / .targets, Directory.Packages.props → directory build properties
//! - *.csproj / *.vbproj / *.fsproj → SDK-style or legacy project, decided by content

use crate::domain::ReferenceKind;
use crate::error::ClassifyError;
use crate::manifest::directory_build::DIRECTORY_BUILD_FILES;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

static PROJECT_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<Project\b").unwrap());

// SDK-style markers:
// <Project Sdk="Microsoft.NET.Sdk">
// <Sdk Name="Microsoft.NET.Sdk" />
// <Import Project="Sdk.props" Sdk="Microsoft.NET.Sdk" />
static SDK_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<Project\b[^>]*\sSdk\s*=|<Sdk\s[^>]*\bName\s*=|<Import\b[^>]*\sSdk\s*="#)
        .unwrap()
});

/// What the file name alone says about a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSignal {
    /// The name fully determines the kind
    Kind(ReferenceKind),
    /// A project file; the content decides legacy vs SDK-style
    ProjectFile,
    Unknown,
}

fn name_signal(path: &Path) -> NameSignal {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return NameSignal::Unknown;
    };

    if file_name.eq_ignore_ascii_case("packages.config") {
        return NameSignal::Kind(ReferenceKind::LegacyPackagesList);
    }
    if DIRECTORY_BUILD_FILES
        .iter()
        .any(|name| file_name.eq_ignore_ascii_case(name))
    {
        return NameSignal::Kind(ReferenceKind::DirectoryBuildProperties);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("nuspec") => NameSignal::Kind(ReferenceKind::PackageManifest),
        Some(ext) if PROJECT_EXTENSIONS.contains(&ext) => NameSignal::ProjectFile,
        _ => NameSignal::Unknown,
    }
}

/// Returns true if the project content uses the SDK-style format
fn is_sdk_project(content: &str) -> bool {
    SDK_MARKER_RE.is_match(content)
}

/// Classifies a project file from its content
pub fn classify_project_content(path: &Path, content: &str) -> Result<ReferenceKind, ClassifyError> {
    let has_project_root = PROJECT_ROOT_RE.is_match(content);
    if !has_project_root {
        return Err(ClassifyError::unrecognized(
            path,
            "project file has no <Project> element",
        ));
    }

    if is_sdk_project(content) {
        Ok(ReferenceKind::ModernProjectFile)
    } else {
        Ok(ReferenceKind::LegacyProjectFile)
    }
}

/// Classifies a reference from its path and, for project files, its content
///
/// `content` is only consulted for project files; pass `None` when it could
/// not be read.
pub fn classify_content(
    path: &Path,
    content: Option<&str>,
) -> Result<ReferenceKind, ClassifyError> {
    match name_signal(path) {
        NameSignal::Kind(kind) => Ok(kind),
        NameSignal::ProjectFile => match content {
            Some(content) => classify_project_content(path, content),
            None => Err(ClassifyError::unrecognized(
                path,
                "project file could not be read",
            )),
        },
        NameSignal::Unknown => Err(ClassifyError::unrecognized(
            path,
            "file is not a packages.config, project, nuspec or directory build file",
        )),
    }
}

/// Classifies a reference, reading the file when its name is not conclusive
pub async fn classify(path: &Path) -> Result<ReferenceKind, ClassifyError> {
    if name_signal(path) != NameSignal::ProjectFile {
        return classify_content(path, None);
    }

    match tokio::fs::read_to_string(path).await {
        Ok(content) => classify_content(path, Some(&content)),
        Err(e) => Err(ClassifyError::unrecognized(
            path,
            format!("project file could not be read: {}", e),
        )),
    }
}
