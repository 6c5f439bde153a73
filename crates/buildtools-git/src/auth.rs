use std::path::{Path, PathBuf};

use crate::credentials::{CredentialError, GitCredentials};

const ASKPASS_FILE: &str = "askpass.sh";
const PASSWORD_VAR: &str = "BUILDTOOLS_SSH_PASSWORD";

/// Environment that makes git authenticate over SSH with a resolved key.
///
/// Built after the key has been opened, so a missing or unreadable key fails
/// before any git command runs.
pub struct SshAuth {
    env: Vec<(String, String)>,
}

impl SshAuth {
    /// Validate the key and build the git environment.
    ///
    /// With a password, an askpass helper is written into `scratch` and the
    /// password travels through an environment variable, never argv.
    pub fn prepare(credentials: &GitCredentials, scratch: &Path) -> Result<Self, CredentialError> {
        std::fs::File::open(&credentials.key).map_err(|e| CredentialError::KeyUnreadable {
            path: credentials.key.clone(),
            source: e,
        })?;

        let ssh_command = format!(
            "ssh -i {} -o IdentitiesOnly=yes -o User={} -o StrictHostKeyChecking=accept-new",
            shell_quote(&credentials.key.to_string_lossy()),
            shell_quote(&credentials.user),
        );
        let mut env = vec![
            ("GIT_SSH_COMMAND".to_owned(), ssh_command),
            ("GIT_TERMINAL_PROMPT".to_owned(), "0".to_owned()),
        ];

        if let Some(password) = credentials.password.as_deref() {
            let helper = write_askpass(scratch)?;
            env.push(("SSH_ASKPASS".to_owned(), helper.to_string_lossy().into_owned()));
            env.push(("SSH_ASKPASS_REQUIRE".to_owned(), "force".to_owned()));
            env.push((PASSWORD_VAR.to_owned(), password.to_owned()));
        }

        tracing::debug!(key = %credentials.key.display(), user = %credentials.user, "ssh auth prepared");
        Ok(Self { env })
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

impl std::fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("SshAuth").field("env", &keys).finish()
    }
}

fn write_askpass(scratch: &Path) -> Result<PathBuf, CredentialError> {
    let path = scratch.join(ASKPASS_FILE);
    let script = format!("#!/bin/sh\nprintf '%s\\n' \"${PASSWORD_VAR}\"\n");
    std::fs::write(&path, script).map_err(|e| CredentialError::Askpass {
        path: path.clone(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700)).map_err(|e| {
            CredentialError::Askpass {
                path: path.clone(),
                source: e,
            }
        })?;
    }

    Ok(path)
}

/// Single-quote a value for the shell that git spawns for `GIT_SSH_COMMAND`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
