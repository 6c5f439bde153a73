use std::path::{Component, Path, PathBuf};

use buildtools_core::{GitConfig, VcsInfo};
use buildtools_files::{DescriptorSet, FilesError};

use crate::auth::SshAuth;
use crate::credentials::{CredentialError, GitCredentials};
use crate::executor::{GitExecutor, RealExecutor};
use crate::git::GitError;

const REPO_DIR: &str = "repo";

/// Git operations client, parameterized over the executor for testability.
pub struct GitClient<E: GitExecutor = RealExecutor> {
    executor: E,
}

impl GitClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for GitClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: GitExecutor> GitClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Identity ──

    /// Commit and branch of the checkout at `dir`.
    ///
    /// Anything git cannot answer comes back empty; deciding whether that
    /// is fatal belongs to the caller.
    pub async fn identify(&self, dir: &Path) -> VcsInfo {
        let commit = self.rev_parse(dir, &["rev-parse", "HEAD"]).await;
        let branch = self
            .rev_parse(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await;
        VcsInfo { commit, branch }
    }

    async fn rev_parse(&self, dir: &Path, a: &[&str]) -> String {
        let a: Vec<String> = a.iter().map(|s| (*s).to_owned()).collect();
        match self.executor.exec(dir, &a, &[]).await {
            Ok(out) => out.trim().to_owned(),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "no git information");
                String::new()
            }
        }
    }

    // ── Promote ──

    /// Clone the GitOps repository, write the descriptors under the
    /// destination, and commit and push only when something changed.
    ///
    /// A local non-bare repository is updated in place: the commit lands on
    /// its checked-out branch and nothing is pushed.
    ///
    /// `notify` receives the push announcement before the push starts, or
    /// the commit announcement for an in-place update.
    pub async fn promote(
        &self,
        request: &PromoteRequest,
        mut notify: impl FnMut(&str),
    ) -> Result<CommitOutcome, PromoteError> {
        if request.url.trim().is_empty() {
            return Err(PromoteError::MissingUrl);
        }
        check_destination(&request.destination)?;

        let scratch = tempfile::Builder::new()
            .prefix("buildtools-promote-")
            .tempdir()
            .map_err(|e| PromoteError::Scratch { source: e })?;
        let auth = SshAuth::prepare(&request.credentials, scratch.path())?;
        let env = auth.env();

        let (repo, push) = match self.checked_out_repository(&request.url).await {
            Some(repo) => (repo, false),
            None => {
                self.executor
                    .exec(
                        scratch.path(),
                        &args(["clone", "--quiet", "--", request.url.as_str(), REPO_DIR]),
                        env,
                    )
                    .await
                    .map_err(|e| PromoteError::Clone {
                        url: request.url.clone(),
                        source: e,
                    })?;
                (scratch.path().join(REPO_DIR), true)
            }
        };

        let pathspec = if request.destination.is_empty() {
            "."
        } else {
            request.destination.as_str()
        };
        request
            .descriptors
            .write_to(&repo.join(pathspec))
            .map_err(|e| PromoteError::Write { source: e })?;

        self.executor
            .exec(&repo, &args(["add", "-A", "--", pathspec]), env)
            .await
            .map_err(|e| PromoteError::Stage { source: e })?;
        let status = self
            .executor
            .exec(&repo, &args(["status", "--porcelain", "--", pathspec]), env)
            .await
            .map_err(|e| PromoteError::Stage { source: e })?;
        if status.trim().is_empty() {
            tracing::debug!(destination = %request.destination, "working tree matches HEAD");
            return Ok(CommitOutcome::default());
        }

        let user_name = format!("user.name={}", request.author.name);
        let user_email = format!("user.email={}", request.author.email);
        self.executor
            .exec(
                &repo,
                &args([
                    "-c",
                    user_name.as_str(),
                    "-c",
                    user_email.as_str(),
                    "-c",
                    "commit.gpgsign=false",
                    "commit",
                    "--quiet",
                    "-m",
                    request.message.as_str(),
                    "--",
                    pathspec,
                ]),
                env,
            )
            .await
            .map_err(|e| PromoteError::Commit { source: e })?;
        let hash = self
            .executor
            .exec(&repo, &args(["rev-parse", "HEAD"]), env)
            .await
            .map_err(|e| PromoteError::Commit { source: e })?
            .trim()
            .to_owned();

        let location = format!(
            "{}/{}",
            request.url.trim_end_matches('/'),
            request.destination
        );
        if !push {
            notify(&format!("committed {hash} to {location}"));
            return Ok(CommitOutcome {
                attempted: true,
                hash: Some(hash),
                pushed: false,
            });
        }

        notify(&format!("pushing commit {hash} to {location}"));
        self.executor
            .exec(&repo, &args(["push", "--quiet", "origin", "HEAD"]), env)
            .await
            .map_err(|e| PromoteError::Push { source: e })?;

        Ok(CommitOutcome {
            attempted: true,
            hash: Some(hash),
            pushed: true,
        })
    }

    /// `url` as a directory when it is a local repository with a work tree.
    async fn checked_out_repository(&self, url: &str) -> Option<PathBuf> {
        let dir = Path::new(url);
        if !dir.is_dir() {
            return None;
        }
        match self
            .executor
            .exec(dir, &args(["rev-parse", "--is-bare-repository"]), &[])
            .await
        {
            Ok(out) if out.trim() == "false" => Some(dir.to_path_buf()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(url, error = %e, "not a local repository, cloning");
                None
            }
        }
    }
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// Path inside the GitOps repository that receives a build's descriptors:
/// `<path>/<build name>`, with stray slashes removed.
///
/// Fails when the result would leave the repository.
pub fn destination_path(path: &str, build_name: &str) -> Result<String, PromoteError> {
    let path = path.trim_matches('/');
    let destination = match (path.is_empty(), build_name.is_empty()) {
        (true, _) => build_name.to_owned(),
        (false, true) => path.to_owned(),
        (false, false) => format!("{path}/{build_name}"),
    };
    check_destination(&destination)?;
    Ok(destination)
}

fn check_destination(destination: &str) -> Result<(), PromoteError> {
    let escapes = Path::new(destination)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PromoteError::InvalidDestination {
            destination: destination.to_owned(),
        });
    }
    Ok(())
}

// ── Types ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    pub const DEFAULT_NAME: &'static str = "buildtools";
    pub const DEFAULT_EMAIL: &'static str = "buildtools@localhost";

    pub fn from_config(config: &GitConfig) -> Self {
        let or_default = |value: Option<&String>, default: &str| {
            value
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_owned())
        };
        Self {
            name: or_default(config.name.as_ref(), Self::DEFAULT_NAME),
            email: or_default(config.email.as_ref(), Self::DEFAULT_EMAIL),
        }
    }
}

/// Everything the gateway needs for one promotion.
#[derive(Debug, Clone)]
pub struct PromoteRequest {
    pub url: String,
    pub credentials: GitCredentials,
    pub descriptors: DescriptorSet,
    /// Repository-relative directory, see [`destination_path`]
    pub destination: String,
    pub author: AuthorIdentity,
    pub message: String,
}

/// What the gateway did. A default value is the up-to-date no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    pub attempted: bool,
    pub hash: Option<String>,
    pub pushed: bool,
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum PromoteError {
    #[error("gitops repository url is empty")]
    MissingUrl,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("destination '{destination}' leaves the repository")]
    InvalidDestination { destination: String },

    #[error("failed to create scratch directory")]
    Scratch { source: std::io::Error },

    #[error("failed to clone {url}")]
    Clone { url: String, source: GitError },

    #[error("failed to write descriptors")]
    Write { source: FilesError },

    #[error("failed to stage descriptors")]
    Stage { source: GitError },

    #[error("failed to commit descriptors")]
    Commit { source: GitError },

    #[error("failed to push")]
    Push { source: GitError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_joins_path_and_name() {
        let dest = |path, name| destination_path(path, name).unwrap();
        assert_eq!(dest("apps", "dummy-repo"), "apps/dummy-repo");
        assert_eq!(dest("/apps/prod/", "web"), "apps/prod/web");
        assert_eq!(dest("", "web"), "web");
        assert_eq!(dest("apps", ""), "apps");
    }

    #[test]
    fn destination_rejects_parent_components() {
        let cases = [
            ("../..", "web"),
            ("apps", ".."),
            ("apps/../../etc", "web"),
            ("", ".."),
        ];
        for (path, name) in cases {
            let err = destination_path(path, name).unwrap_err();
            assert!(
                matches!(err, PromoteError::InvalidDestination { .. }),
                "{path}/{name}: {err:?}"
            );
        }
    }

    #[test]
    fn author_defaults() {
        let author = AuthorIdentity::from_config(&GitConfig::default());
        assert_eq!(author.name, "buildtools");
        assert_eq!(author.email, "buildtools@localhost");
    }

    #[test]
    fn author_from_config() {
        let config = GitConfig {
            name: Some("Release Bot".into()),
            email: Some(String::new()),
            ..GitConfig::default()
        };
        let author = AuthorIdentity::from_config(&config);
        assert_eq!(author.name, "Release Bot");
        assert_eq!(author.email, "buildtools@localhost");
    }
}
