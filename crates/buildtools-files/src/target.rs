use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::FilesError;

/// The kind of file being resolved: its suffix and the label used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKind {
    pub suffix: &'static str,
    pub label: &'static str,
}

impl FileKind {
    /// Deployment descriptors
    pub const DESCRIPTOR: FileKind = FileKind {
        suffix: ".yaml",
        label: "file",
    };

    /// Hook scripts run by the build and deploy stages
    pub const SCRIPT: FileKind = FileKind {
        suffix: ".sh",
        label: "script",
    };
}

/// A file selected for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    pub name: String,
    pub path: PathBuf,
}

pub fn find_files_for_target(dir: &Path, target: &str) -> Result<Vec<TargetFile>, FilesError> {
    files_for_target(dir, target, FileKind::DESCRIPTOR)
}

pub fn find_scripts_for_target(dir: &Path, target: &str) -> Result<Vec<TargetFile>, FilesError> {
    files_for_target(dir, target, FileKind::SCRIPT)
}

/// Resolve the files in `dir` that apply to `target`.
///
/// Candidates are `<name>-<target><suffix>` overrides and dash-free
/// `<name><suffix>` defaults. Dashed files for other targets are skipped. A
/// default is dropped when its override exists. The result is sorted by name.
pub fn files_for_target(
    dir: &Path,
    target: &str,
    kind: FileKind,
) -> Result<Vec<TargetFile>, FilesError> {
    let read_err = |e| FilesError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };
    let override_suffix = format!("-{target}{}", kind.suffix);

    let mut candidates: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !name.ends_with(kind.suffix) || !path.is_file() {
            continue;
        }

        tracing::debug!("considering {} '{name}' for target: {target}", kind.label);
        if name.ends_with(&override_suffix) || !name.contains('-') {
            candidates.insert(name, path);
        } else {
            tracing::debug!("not using {} '{name}' for target: {target}", kind.label);
        }
    }

    let mut result = Vec::with_capacity(candidates.len());
    for (name, path) in &candidates {
        let selected = if name.ends_with(&override_suffix) {
            true
        } else {
            let stem = name.strip_suffix(kind.suffix).unwrap_or(name);
            !candidates.contains_key(&format!("{stem}{override_suffix}"))
        };

        if selected {
            tracing::debug!("using {} '{name}' for target: {target}", kind.label);
            result.push(TargetFile {
                name: name.clone(),
                path: path.clone(),
            });
        } else {
            tracing::debug!("not using {} '{name}' for target: {target}", kind.label);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_with(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in files {
            std::fs::write(tmp.path().join(name), name.as_bytes()).unwrap();
        }
        tmp
    }

    fn names(files: &[TargetFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn override_replaces_default() {
        let tmp = dir_with(&["a.yaml", "a-prod.yaml", "b.yaml"]);
        let files = find_files_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(names(&files), ["a-prod.yaml", "b.yaml"]);
    }

    #[test]
    fn other_targets_overrides_are_ignored() {
        let tmp = dir_with(&["a.yaml", "a-prod.yaml", "b.yaml"]);
        let files = find_files_for_target(tmp.path(), "staging").unwrap();
        assert_eq!(names(&files), ["a.yaml", "b.yaml"]);
    }

    #[test]
    fn dashed_file_without_default_is_never_picked_for_other_target() {
        let tmp = dir_with(&["x-other.yaml"]);
        let files = find_files_for_target(tmp.path(), "mine").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn target_suffix_must_match_exactly() {
        let tmp = dir_with(&["a-preprod.yaml", "a.yaml"]);
        let files = find_files_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(names(&files), ["a.yaml"]);
    }

    #[test]
    fn other_suffixes_are_ignored() {
        let tmp = dir_with(&["deploy.yaml", "deploy.yml", "README.md", "setup.sh"]);
        let files = find_files_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(names(&files), ["deploy.yaml"]);
    }

    #[test]
    fn scripts_use_sh_suffix() {
        let tmp = dir_with(&["pre.sh", "pre-prod.sh", "post.sh", "deploy.yaml"]);
        let scripts = find_scripts_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(names(&scripts), ["post.sh", "pre-prod.sh"]);
    }

    #[test]
    fn directories_are_skipped() {
        let tmp = dir_with(&["a.yaml"]);
        std::fs::create_dir(tmp.path().join("nested.yaml")).unwrap();
        let files = find_files_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(names(&files), ["a.yaml"]);
    }

    #[test]
    fn empty_dir_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(find_files_for_target(tmp.path(), "prod").unwrap().is_empty());
    }

    #[test]
    fn missing_dir_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("k8s");
        let err = find_files_for_target(&missing, "prod").unwrap_err();
        assert!(matches!(err, FilesError::ReadDir { ref path, .. } if path == &missing));
    }

    #[test]
    fn paths_point_into_dir() {
        let tmp = dir_with(&["a.yaml"]);
        let files = find_files_for_target(tmp.path(), "prod").unwrap();
        assert_eq!(files[0].path, tmp.path().join("a.yaml"));
    }
}
