//! Ordering of classified references into execution stages
//!
//! A reference must complete before another starts when:
//! - it is a directory build file whose directory contains the other file
//! - the other project lists it in its project references
//! - both name the same file (input order wins)
//!
//! Stages are produced by a level-by-level Kahn sort. Every reference in a
//! stage depends only on references in earlier stages.

use crate::domain::{normalize_path, ClassifiedReference};
use crate::error::UpdateError;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Ordered stages of indices into the sorted reference slice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub stages: Vec<Vec<usize>>,
}

impl ExecutionPlan {
    /// Number of units across all stages
    pub fn unit_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Builds the ordering graph and sorts it into stages
pub struct DependencySorter;

impl DependencySorter {
    /// Sort `references` into stages
    ///
    /// Ties inside a stage keep input order. A cycle is fatal and reported
    /// with the paths of the references involved.
    pub fn sort(references: &[ClassifiedReference]) -> Result<ExecutionPlan, UpdateError> {
        let successors = Self::build_edges(references);
        Self::stages(references, &successors)
    }

    /// Adjacency sets: `successors[a]` holds every `b` with edge a -> b
    fn build_edges(references: &[ClassifiedReference]) -> Vec<BTreeSet<usize>> {
        let paths: Vec<PathBuf> = references.iter().map(|r| normalize_path(r.path())).collect();
        let mut successors = vec![BTreeSet::new(); references.len()];

        let mut by_path: HashMap<&Path, Vec<usize>> = HashMap::new();
        for (index, path) in paths.iter().enumerate() {
            by_path.entry(path.as_path()).or_default().push(index);
        }

        // duplicates run in input order
        for indices in by_path.values() {
            for pair in indices.windows(2) {
                successors[pair[0]].insert(pair[1]);
            }
        }

        for (a, reference) in references.iter().enumerate() {
            if !reference.kind.is_directory_wide() {
                continue;
            }
            let dir = parent_dir(&paths[a]);

            for (b, other) in references.iter().enumerate() {
                if a == b || paths[a] == paths[b] || !paths[b].starts_with(dir) {
                    continue;
                }
                if other.kind.is_directory_wide() && parent_dir(&paths[b]) == dir {
                    continue;
                }
                successors[a].insert(b);
            }
        }

        for (b, reference) in references.iter().enumerate() {
            let base = parent_dir(&paths[b]);
            for project in &reference.reference.project_references {
                let target = if project.is_absolute() {
                    normalize_path(project)
                } else {
                    normalize_path(&base.join(project))
                };
                if let Some(indices) = by_path.get(target.as_path()) {
                    for &a in indices.iter().filter(|&&a| a != b) {
                        successors[a].insert(b);
                    }
                }
            }
        }

        successors
    }

    fn stages(
        references: &[ClassifiedReference],
        successors: &[BTreeSet<usize>],
    ) -> Result<ExecutionPlan, UpdateError> {
        let mut in_degree = vec![0usize; references.len()];
        for targets in successors {
            for &b in targets {
                in_degree[b] += 1;
            }
        }

        let mut stages = Vec::new();
        let mut current: Vec<usize> = (0..references.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut placed = 0;

        while !current.is_empty() {
            let mut next = Vec::new();
            for &a in &current {
                for &b in &successors[a] {
                    in_degree[b] -= 1;
                    if in_degree[b] == 0 {
                        next.push(b);
                    }
                }
            }
            next.sort_unstable();
            placed += current.len();
            stages.push(std::mem::replace(&mut current, next));
        }

        if placed != references.len() {
            let paths = Self::cycle_members(&in_degree, successors)
                .into_iter()
                .map(|i| references[i].path().to_path_buf())
                .collect();
            return Err(UpdateError::CyclicReferenceGraph { paths });
        }

        Ok(ExecutionPlan { stages })
    }

    /// Unplaced nodes minus those only reachable downstream of a cycle
    fn cycle_members(in_degree: &[usize], successors: &[BTreeSet<usize>]) -> Vec<usize> {
        let mut remaining: BTreeSet<usize> = (0..in_degree.len())
            .filter(|&i| in_degree[i] > 0)
            .collect();

        loop {
            let sinks: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| !successors[i].iter().any(|s| remaining.contains(s)))
                .collect();
            if sinks.is_empty() {
                break;
            }
            for sink in sinks {
                remaining.remove(&sink);
            }
        }

        remaining.into_iter().collect()
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileReference, ReferenceKind, UpdateRequest};

    fn classified(path: &str, kind: ReferenceKind) -> ClassifiedReference {
        ClassifiedReference::new(FileReference::new(path, "1.0.0"), kind)
    }

    #[test]
    fn test_empty_input() {
        let plan = DependencySorter::sort(&[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.unit_count(), 0);
    }

    #[test]
    fn test_directory_props_before_contained_references() {
        let references = vec![
            classified(
                "/repo/Directory.Build.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
            classified("/repo/A/A.csproj", ReferenceKind::ModernProjectFile),
            classified("/repo/B/packages.config", ReferenceKind::LegacyPackagesList),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_unrelated_references_share_a_stage() {
        let references = vec![
            classified("/repo/A/A.csproj", ReferenceKind::ModernProjectFile),
            classified("/repo/B/B.csproj", ReferenceKind::LegacyProjectFile),
            classified("/repo/C/C.nuspec", ReferenceKind::PackageManifest),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_props_outside_directory_is_unordered() {
        let references = vec![
            classified("/repo/A/A.csproj", ReferenceKind::ModernProjectFile),
            classified(
                "/repo/B/Directory.Build.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0, 1]]);
    }

    #[test]
    fn test_sibling_directory_build_files_do_not_order_each_other() {
        let references = vec![
            classified(
                "/repo/Directory.Build.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
            classified(
                "/repo/Directory.Packages.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
            classified("/repo/App/App.csproj", ReferenceKind::ModernProjectFile),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_nested_directory_props() {
        let references = vec![
            classified("/repo/src/App/App.csproj", ReferenceKind::ModernProjectFile),
            classified(
                "/repo/src/Directory.Build.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
            classified(
                "/repo/Directory.Build.props",
                ReferenceKind::DirectoryBuildProperties,
            ),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn test_project_references_order_referenced_first() {
        let app = FileReference::new("/repo/App/App.csproj", "1.0.0")
            .with_project_reference("../Core/Core.csproj");
        let references = vec![
            ClassifiedReference::new(app, ReferenceKind::ModernProjectFile),
            classified("/repo/Core/Core.csproj", ReferenceKind::ModernProjectFile),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_project_references_from_request_with_relative_base() {
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

        for base in ["", "req"] {
            let request = UpdateRequest::from_json(json, Path::new(base)).unwrap();
            let references: Vec<_> = request
                .references
                .into_iter()
                .map(|r| ClassifiedReference::new(r, ReferenceKind::ModernProjectFile))
                .collect();

            let plan = DependencySorter::sort(&references).unwrap();
            assert_eq!(plan.stages, vec![vec![1], vec![0]], "base {:?}", base);
        }
    }

    #[test]
    fn test_duplicate_paths_serialized_in_input_order() {
        let references = vec![
            classified("/repo/App/App.csproj", ReferenceKind::ModernProjectFile),
            classified("/repo/Other/Other.csproj", ReferenceKind::ModernProjectFile),
            classified("/repo/App/./App.csproj", ReferenceKind::ModernProjectFile),
        ];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let a = FileReference::new("/repo/A/A.csproj", "1.0.0")
            .with_project_reference("/repo/B/B.csproj");
        let b = FileReference::new("/repo/B/B.csproj", "1.0.0")
            .with_project_reference("/repo/A/A.csproj");
        let c = FileReference::new("/repo/C/C.csproj", "1.0.0")
            .with_project_reference("/repo/A/A.csproj");
        let references = vec![
            ClassifiedReference::new(a, ReferenceKind::ModernProjectFile),
            ClassifiedReference::new(b, ReferenceKind::ModernProjectFile),
            ClassifiedReference::new(c, ReferenceKind::ModernProjectFile),
        ];

        let err = DependencySorter::sort(&references).unwrap_err();
        match err {
            UpdateError::CyclicReferenceGraph { paths } => {
                assert_eq!(
                    paths,
                    vec![
                        PathBuf::from("/repo/A/A.csproj"),
                        PathBuf::from("/repo/B/B.csproj")
                    ]
                );
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_project_reference_is_ignored() {
        let app = FileReference::new("/repo/App/App.csproj", "1.0.0")
            .with_project_reference("../Missing/Missing.csproj");
        let references = vec![ClassifiedReference::new(
            app,
            ReferenceKind::ModernProjectFile,
        )];

        let plan = DependencySorter::sort(&references).unwrap();
        assert_eq!(plan.stages, vec![vec![0]]);
    }
}
