//! Git credential resolution.
//!
//! Resolution is pure: it never touches the filesystem. The key file is only
//! opened when [`crate::SshAuth::prepare`] authenticates with it.

use std::path::PathBuf;

use buildtools_core::{BuildContext, GitConfig};

pub const DEFAULT_USER: &str = "git";
pub const DEFAULT_KEY: &str = "~/.ssh/id_rsa";

/// Credential values passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub user: Option<String>,
    pub key: Option<String>,
    pub password: Option<String>,
}

/// The single credential set used for one promotion.
#[derive(Clone, PartialEq, Eq)]
pub struct GitCredentials {
    pub user: String,
    pub key: PathBuf,
    pub password: Option<String>,
}

impl std::fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCredentials")
            .field("user", &self.user)
            .field("key", &self.key)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl GitCredentials {
    /// Resolve each field from the CLI, then the config file, then the default.
    ///
    /// Empty strings count as unset at every level.
    pub fn resolve(cli: &CredentialOverrides, config: &GitConfig, ctx: &BuildContext) -> Self {
        let user = pick(cli.user.as_deref(), config.user.as_deref()).unwrap_or(DEFAULT_USER);
        let key = pick(cli.key.as_deref(), config.key.as_deref()).unwrap_or(DEFAULT_KEY);
        let password = pick(cli.password.as_deref(), config.password.as_deref());

        Self {
            user: user.to_owned(),
            key: ctx.expand_home(key),
            password: password.map(str::to_owned),
        }
    }
}

fn pick<'a>(cli: Option<&'a str>, config: Option<&'a str>) -> Option<&'a str> {
    cli.filter(|v| !v.is_empty())
        .or_else(|| config.filter(|v| !v.is_empty()))
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("ssh key: open {path}")]
    KeyUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write askpass helper {path}")]
    Askpass {
        path: PathBuf,
        source: std::io::Error,
    },
}
