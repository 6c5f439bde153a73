use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Everything an invocation reads from its surroundings.
///
/// Built once from the process in `main`; tests construct it directly so no
/// entry point depends on the current directory or the global environment.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Directory holding `.buildtools.yaml` and the `k8s/` descriptors
    pub working_dir: PathBuf,
    /// Home directory used to expand `~` in key paths
    pub home_dir: Option<PathBuf>,
    /// Environment variables visible to CI detection
    pub env: HashMap<String, String>,
}

impl BuildContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            home_dir: None,
            env: HashMap::new(),
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Returns the variable's value, treating empty strings as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Expands a leading `~` to the home directory.
    ///
    /// Paths without `~`, or when no home directory is known, are returned as-is.
    pub fn expand_home(&self, path: &str) -> PathBuf {
        match (path.strip_prefix('~'), self.home_dir.as_deref()) {
            (Some(rest), Some(home)) => {
                let rest = rest.trim_start_matches('/');
                if rest.is_empty() {
                    home.to_path_buf()
                } else {
                    home.join(rest)
                }
            }
            _ => PathBuf::from(path),
        }
    }

    /// Basename of the working directory, used as the fallback build name.
    pub fn dir_name(&self) -> String {
        self.working_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
