//! Update request handed over by the resolution stage

use super::{normalize_path, FileReference};
use crate::error::RequestError;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A fully-resolved package update to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Package identifier being updated
    pub selected_package_id: String,
    /// Version every reference is moved to
    pub selected_version: Version,
    /// Feed the selected version was found on
    pub originating_source: String,
    /// Feeds available for restore
    #[serde(default)]
    pub available_sources: Vec<String>,
    /// Every declaration site of the package, in discovery order
    #[serde(default)]
    pub references: Vec<FileReference>,
}

impl UpdateRequest {
    /// Creates a request without references
    pub fn new(
        package_id: impl Into<String>,
        version: Version,
        originating_source: impl Into<String>,
    ) -> Self {
        Self {
            selected_package_id: package_id.into(),
            selected_version: version,
            originating_source: originating_source.into(),
            available_sources: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Adds an available source (builder pattern)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.available_sources.push(source.into());
        self
    }

    /// Adds a file reference (builder pattern)
    pub fn with_reference(mut self, reference: FileReference) -> Self {
        self.references.push(reference);
        self
    }

    /// Parses a JSON request, resolving relative paths against `base_dir`
    ///
    /// Every path in the result is absolute, so later stages never depend on
    /// the working directory.
    pub fn from_json(content: &str, base_dir: &Path) -> Result<Self, RequestError> {
        let mut request: UpdateRequest =
            serde_json::from_str(content).map_err(|e| RequestError::Parse {
                message: e.to_string(),
            })?;
        let base_dir = absolute_dir(base_dir)?;
        request.references = request
            .references
            .into_iter()
            .map(|r| r.resolved_against(&base_dir))
            .collect();
        request.validate()?;
        Ok(request)
    }

    /// Reads and parses a JSON request file
    pub fn from_file(path: &Path) -> Result<Self, RequestError> {
        let content = std::fs::read_to_string(path).map_err(|e| RequestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&content, base_dir)
    }

    /// Checks the fields the resolution stage is expected to fill in
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.selected_package_id.trim().is_empty() {
            return Err(RequestError::invalid("selectedPackageId is empty"));
        }
        if self.originating_source.trim().is_empty() {
            return Err(RequestError::invalid("originatingSource is empty"));
        }
        Ok(())
    }

    /// Feeds handed to restore: the available set, or the originating feed alone
    pub fn restore_sources(&self) -> Vec<&str> {
        if self.available_sources.is_empty() {
            vec![self.originating_source.as_str()]
        } else {
            self.available_sources.iter().map(String::as_str).collect()
        }
    }
}

/// Absolute form of `dir`; an empty path means the current directory
fn absolute_dir(dir: &Path) -> Result<PathBuf, RequestError> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    std::path::absolute(dir)
        .map(|absolute| normalize_path(&absolute))
        .map_err(|e| RequestError::Read {
            path: dir.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUGET_ORG: &str = "https://api.nuget.org/v3/index.json";

    #[test]
    fn test_builder() {
        let request = UpdateRequest::new("Newtonsoft.Json", Version::new(13, 0, 3), NUGET_ORG)
            .with_source(NUGET_ORG)
            .with_reference(FileReference::new("App.csproj", "12.0.1"));
        assert_eq!(request.references.len(), 1);
        assert_eq!(request.available_sources, vec![NUGET_ORG]);
    }

    #[test]
    fn test_from_json_resolves_paths() {
        let json = r#"{
            "selectedPackageId": "Serilog",
            "selectedVersion": "3.1.1",
            "originatingSource": "https://api.nuget.org/v3/index.json",
            "availableSources": ["https://api.nuget.org/v3/index.json", "https://feed.local/v3"],
            "references": [
                {"path": "src/App/App.csproj", "currentVersion": "2.12.0",
                 "projectReferences": ["src/Lib/Lib.csproj"]}
            ]
        }"#;
        let request = UpdateRequest::from_json(json, Path::new("/repo")).unwrap();
        assert_eq!(request.selected_package_id, "Serilog");
        assert_eq!(request.selected_version, Version::new(3, 1, 1));
        assert_eq!(
            request.references[0].path,
            PathBuf::from("/repo/src/App/App.csproj")
        );
        assert_eq!(
            request.references[0].project_references[0],
            PathBuf::from("/repo/src/Lib/Lib.csproj")
        );
        assert_eq!(request.restore_sources().len(), 2);
    }

    #[test]
    fn test_from_json_relative_base_yields_absolute_paths() {
        let json = r#"{
            "selectedPackageId": "Serilog",
            "selectedVersion": "3.1.1",
            "originatingSource": "https://api.nuget.org/v3/index.json",
            "references": [
                {"path": "App/App.csproj", "currentVersion": "2.12.0",
                 "projectReferences": ["Lib/Lib.csproj"]},
                {"path": "Lib/Lib.csproj", "currentVersion": "2.12.0"}
            ]
        }"#;
        let cwd = std::env::current_dir().unwrap();

        for base in ["", "req", "./req"] {
            let request = UpdateRequest::from_json(json, Path::new(base)).unwrap();
            let expected_base = normalize_path(&cwd.join(base));
            assert!(request.references[0].path.is_absolute());
            assert_eq!(
                request.references[0].path,
                expected_base.join("App/App.csproj")
            );
            assert_eq!(
                request.references[0].project_references[0],
                expected_base.join("Lib/Lib.csproj")
            );
        }
    }

    #[test]
    fn test_from_json_invalid_version() {
        let json = r#"{
            "selectedPackageId": "Serilog",
            "selectedVersion": "not-a-version",
            "originatingSource": "https://api.nuget.org/v3/index.json"
        }"#;
        let err = UpdateRequest::from_json(json, Path::new(".")).unwrap_err();
        assert!(matches!(err, RequestError::Parse { .. }));
    }

    #[test]
    fn test_validate_empty_package_id() {
        let request = UpdateRequest::new("  ", Version::new(1, 0, 0), NUGET_ORG);
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("selectedPackageId"));
    }

    #[test]
    fn test_restore_sources_falls_back_to_origin() {
        let request = UpdateRequest::new("Serilog", Version::new(1, 0, 0), NUGET_ORG);
        assert_eq!(request.restore_sources(), vec![NUGET_ORG]);
    }

    #[test]
    fn test_from_file_missing() {
        let err = UpdateRequest::from_file(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(matches!(err, RequestError::Read { .. }));
    }
}
