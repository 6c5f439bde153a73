use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ci::CiKind;

/// File name searched for in the working directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".buildtools.yaml";

/// .buildtools.yaml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildToolsConfig {
    #[serde(default)]
    pub ci: CiConfig,
    #[serde(default)]
    pub git: GitConfig,
    /// Promotion targets keyed by name
    #[serde(default)]
    pub gitops: BTreeMap<String, GitOpsEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CiConfig {
    /// Force a CI provider instead of probing the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<CiKind>,
}

/// Defaults for git author identity and credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Where a target's descriptors are promoted to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitOpsEndpoint {
    /// Remote repository URL (local path or SSH)
    #[serde(default)]
    pub url: String,
    /// Subdirectory inside the repository
    #[serde(default)]
    pub path: String,
    /// Artifact reference to promote instead of the CI commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl BuildToolsConfig {
    /// Load and merge every `.buildtools.yaml` from the filesystem root down
    /// to `dir`. Files closer to `dir` win. No files at all yields defaults.
    pub fn load(dir: &Path) -> crate::Result<Self> {
        let mut files: Vec<PathBuf> = dir
            .ancestors()
            .map(|d| d.join(CONFIG_FILE_NAME))
            .filter(|p| p.is_file())
            .collect();
        files.reverse();

        let mut config = Self::default();
        for path in files {
            tracing::debug!(path = %path.display(), "loading config");
            config = config.merge(Self::load_file(&path)?);
        }
        Ok(config)
    }

    /// Parse a single config file. Empty or comment-only files are empty configs.
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| crate::Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml_ng::Error> {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_value(value)
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(mut self, other: Self) -> Self {
        self.ci.selected = other.ci.selected.or(self.ci.selected);
        self.git = GitConfig {
            name: other.git.name.or(self.git.name),
            email: other.git.email.or(self.git.email),
            user: other.git.user.or(self.git.user),
            key: other.git.key.or(self.git.key),
            password: other.git.password.or(self.git.password),
        };
        self.gitops.extend(other.gitops);
        self
    }

    pub fn gitops_target(&self, target: &str) -> Option<&GitOpsEndpoint> {
        self.gitops.get(target)
    }

    /// Render as YAML for `--config`. The key password is masked.
    pub fn to_yaml(&self) -> crate::Result<String> {
        let mut shown = self.clone();
        if shown.git.password.is_some() {
            shown.git.password = Some("********".to_owned());
        }
        serde_yaml_ng::to_string(&shown).map_err(|e| crate::Error::ConfigRender { source: e })
    }
}
