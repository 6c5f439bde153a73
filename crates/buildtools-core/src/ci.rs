//! CI metadata detection.
//!
//! Each supported CI provider identifies itself through environment
//! variables. Providers are probed in [`CiKind::DETECTION_ORDER`]; the first
//! active one supplies commit, branch, and build name. [`CiKind::Local`] is
//! always active and relies on the working directory's git repository.

use serde::{Deserialize, Serialize};

use crate::context::BuildContext;

/// Source of commit, branch, and raw build name for a build.
pub trait BuildMetadata {
    fn commit(&self) -> &str;
    fn branch(&self) -> &str;
    /// Build name as reported by the provider, before normalization
    fn build_name(&self) -> &str;
}

/// Commit and branch of the working directory's git checkout.
///
/// Empty when the directory is not a repository or has no commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsInfo {
    pub commit: String,
    pub branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CiKind {
    Gitlab,
    Github,
    Buildkite,
    Azure,
    Local,
}

struct ProviderVars {
    /// Any of these being set marks the provider active
    markers: &'static [&'static str],
    commit: &'static str,
    branch: &'static str,
    build_name: &'static str,
}

impl CiKind {
    pub const DETECTION_ORDER: [CiKind; 5] = [
        CiKind::Gitlab,
        CiKind::Github,
        CiKind::Buildkite,
        CiKind::Azure,
        CiKind::Local,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CiKind::Gitlab => "gitlab",
            CiKind::Github => "github",
            CiKind::Buildkite => "buildkite",
            CiKind::Azure => "azure",
            CiKind::Local => "local",
        }
    }

    fn vars(self) -> Option<ProviderVars> {
        match self {
            CiKind::Gitlab => Some(ProviderVars {
                markers: &["GITLAB_CI", "CI_COMMIT_SHA"],
                commit: "CI_COMMIT_SHA",
                branch: "CI_COMMIT_REF_NAME",
                build_name: "CI_PROJECT_NAME",
            }),
            CiKind::Github => Some(ProviderVars {
                markers: &["GITHUB_ACTIONS", "GITHUB_SHA"],
                commit: "GITHUB_SHA",
                branch: "GITHUB_REF_NAME",
                build_name: "GITHUB_REPOSITORY",
            }),
            CiKind::Buildkite => Some(ProviderVars {
                markers: &["BUILDKITE", "BUILDKITE_COMMIT"],
                commit: "BUILDKITE_COMMIT",
                branch: "BUILDKITE_BRANCH",
                build_name: "BUILDKITE_PIPELINE_SLUG",
            }),
            CiKind::Azure => Some(ProviderVars {
                markers: &["TF_BUILD", "BUILD_SOURCEVERSION"],
                commit: "BUILD_SOURCEVERSION",
                branch: "BUILD_SOURCEBRANCHNAME",
                build_name: "BUILD_REPOSITORY_NAME",
            }),
            CiKind::Local => None,
        }
    }

    pub fn is_active(self, ctx: &BuildContext) -> bool {
        match self.vars() {
            Some(vars) => vars.markers.iter().any(|m| ctx.var(m).is_some()),
            None => true,
        }
    }

    /// First active provider in detection order.
    pub fn detect(ctx: &BuildContext) -> CiKind {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|kind| kind.is_active(ctx))
            .unwrap_or(CiKind::Local)
    }
}

/// Build metadata resolved from a CI provider, with VCS fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiMetadata {
    pub kind: CiKind,
    commit: String,
    branch: String,
    build_name: String,
}

impl CiMetadata {
    /// Detect the provider (or use `selected`) and read its metadata.
    pub fn detect(ctx: &BuildContext, selected: Option<CiKind>, vcs: &VcsInfo) -> Self {
        let kind = selected.unwrap_or_else(|| CiKind::detect(ctx));
        Self::from_kind(kind, ctx, vcs)
    }

    pub fn from_kind(kind: CiKind, ctx: &BuildContext, vcs: &VcsInfo) -> Self {
        let (commit, branch, build_name) = match kind.vars() {
            Some(vars) => (
                ctx.var(vars.commit).map(str::to_owned),
                ctx.var(vars.branch).map(str::to_owned),
                ctx.var(vars.build_name).map(|name| match kind {
                    // GITHUB_REPOSITORY is owner/name
                    CiKind::Github => name.rsplit('/').next().unwrap_or(name).to_owned(),
                    _ => name.to_owned(),
                }),
            ),
            None => (None, None, None),
        };

        let metadata = Self {
            kind,
            commit: commit.unwrap_or_else(|| vcs.commit.clone()),
            branch: branch.unwrap_or_else(|| vcs.branch.clone()),
            build_name: build_name.unwrap_or_else(|| ctx.dir_name()),
        };
        tracing::debug!(
            ci = kind.name(),
            commit = %metadata.commit,
            branch = %metadata.branch,
            build_name = %metadata.build_name,
            "detected build metadata"
        );
        metadata
    }
}

impl BuildMetadata for CiMetadata {
    fn commit(&self) -> &str {
        &self.commit
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn build_name(&self) -> &str {
        &self.build_name
    }
}

/// The commit, branch, and normalized name identifying a promoted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    pub commit: String,
    pub branch: String,
    /// Lowercase, `_` replaced by `-`; used as the destination path segment
    pub build_name: String,
}

impl BuildIdentity {
    /// Returns `None` when commit or branch is missing.
    pub fn from_metadata(metadata: &impl BuildMetadata) -> Option<Self> {
        if metadata.commit().is_empty() || metadata.branch().is_empty() {
            return None;
        }
        Some(Self {
            commit: metadata.commit().to_owned(),
            branch: metadata.branch().to_owned(),
            build_name: normalize_build_name(metadata.build_name()),
        })
    }
}

pub fn normalize_build_name(raw: &str) -> String {
    raw.to_lowercase().replace('_', "-")
}
