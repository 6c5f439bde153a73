use std::path::Path;

use crate::git::GitError;

/// Abstraction over git CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// No timeout is applied; clone and push block until git returns.
#[allow(async_fn_in_trait)]
pub trait GitExecutor: Send + Sync {
    /// Run git in `dir` with extra environment variables and capture stdout.
    async fn exec(
        &self,
        dir: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<String, GitError>;
}

/// Real git CLI executor.
pub struct RealExecutor;

impl GitExecutor for RealExecutor {
    async fn exec(
        &self,
        dir: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<String, GitError> {
        use std::process::Stdio;

        tracing::debug!(dir = %dir.display(), "git {}", args.join(" "));
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| GitError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(GitError::CommandFailed {
                args: args.to_vec(),
                stderr,
            })
        }
    }
}
