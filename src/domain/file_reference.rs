//! File reference structures

use super::ReferenceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// One place where the selected package is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    /// Path to the declaring file
    pub path: PathBuf,
    /// Version currently declared in the file
    pub current_version: String,
    /// Project files this project references (they are updated first)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_references: Vec<PathBuf>,
}

impl FileReference {
    /// Creates a new file reference
    pub fn new(path: impl Into<PathBuf>, current_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            current_version: current_version.into(),
            project_references: Vec::new(),
        }
    }

    /// Adds a referenced project (builder pattern)
    pub fn with_project_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_references.push(path.into());
        self
    }

    /// Resolves relative paths against `base`
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
        for reference in &mut self.project_references {
            if reference.is_relative() {
                *reference = base.join(&*reference);
            }
        }
        self
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.current_version)
    }
}

/// A file reference tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedReference {
    pub reference: FileReference,
    pub kind: ReferenceKind,
}

impl ClassifiedReference {
    pub fn new(reference: FileReference, kind: ReferenceKind) -> Self {
        Self { reference, kind }
    }

    pub fn path(&self) -> &Path {
        &self.reference.path
    }
}

/// Lexically normalizes a path by dropping `.` and folding `..`
///
/// Files named in a request may not exist yet on every machine the request
/// is replayed on, so this never touches the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_reference_new() {
        let reference = FileReference::new("src/App/App.csproj", "12.0.1");
        assert_eq!(reference.path, PathBuf::from("src/App/App.csproj"));
        assert_eq!(reference.current_version, "12.0.1");
        assert!(reference.project_references.is_empty());
    }

    #[test]
    fn test_with_project_reference() {
        let reference = FileReference::new("App.csproj", "1.0.0")
            .with_project_reference("../Lib/Lib.csproj");
        assert_eq!(reference.project_references.len(), 1);
    }

    #[test]
    fn test_resolved_against() {
        let reference = FileReference::new("src/App.csproj", "1.0.0")
            .with_project_reference("src/Lib.csproj")
            .resolved_against(Path::new("/repo"));
        assert_eq!(reference.path, PathBuf::from("/repo/src/App.csproj"));
        assert_eq!(
            reference.project_references[0],
            PathBuf::from("/repo/src/Lib.csproj")
        );

        let absolute = FileReference::new("/abs/App.csproj", "1.0.0")
            .resolved_against(Path::new("/repo"));
        assert_eq!(absolute.path, PathBuf::from("/abs/App.csproj"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/repo/src/./App/../Lib/Lib.csproj")),
            PathBuf::from("/repo/src/Lib/Lib.csproj")
        );
        assert_eq!(
            normalize_path(Path::new("../x/y")),
            PathBuf::from("../x/y")
        );
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"path": "a/packages.config", "currentVersion": "1.0.0"}"#;
        let reference: FileReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.current_version, "1.0.0");
        assert!(reference.project_references.is_empty());
    }

    #[test]
    fn test_display() {
        let reference = FileReference::new("App.csproj", "1.0.0");
        assert_eq!(reference.to_string(), "App.csproj (1.0.0)");
    }
}
