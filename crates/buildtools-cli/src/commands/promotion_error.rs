use buildtools_files::FilesError;
use buildtools_git::PromoteError;

/// Failure classes of a promotion; each maps to one exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    Argument,
    Config,
    TargetNotFound,
    UnidentifiedBuild,
    DescriptorNotFound,
    Credential,
    GitTransport,
    Filesystem,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Argument | ErrorKind::Config => -1,
            ErrorKind::TargetNotFound => -2,
            ErrorKind::UnidentifiedBuild => -3,
            ErrorKind::DescriptorNotFound
            | ErrorKind::Credential
            | ErrorKind::GitTransport
            | ErrorKind::Filesystem => -4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PromotionError {
    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    Config(#[from] buildtools_core::Error),

    #[error("no gitops matching {target} found")]
    TargetNotFound { target: String },

    #[error(
        "Commit and/or branch information is missing. \
         Perhaps you're not in a Git repository or forgot to set environment variables?"
    )]
    UnidentifiedBuild,

    #[error("no deployment descriptors found in k8s directory")]
    DescriptorNotFound,

    #[error(transparent)]
    Files(#[from] FilesError),

    #[error("failed to write output")]
    Output { source: std::io::Error },

    #[error(transparent)]
    Promote(#[from] PromoteError),
}

impl PromotionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromotionError::Argument(_) => ErrorKind::Argument,
            PromotionError::Config(_) => ErrorKind::Config,
            PromotionError::TargetNotFound { .. } => ErrorKind::TargetNotFound,
            PromotionError::UnidentifiedBuild => ErrorKind::UnidentifiedBuild,
            PromotionError::DescriptorNotFound => ErrorKind::DescriptorNotFound,
            PromotionError::Files(_) | PromotionError::Output { .. } => ErrorKind::Filesystem,
            PromotionError::Promote(e) => match e {
                PromoteError::Credential(_) => ErrorKind::Credential,
                PromoteError::InvalidDestination { .. }
                | PromoteError::Scratch { .. }
                | PromoteError::Write { .. } => ErrorKind::Filesystem,
                PromoteError::MissingUrl
                | PromoteError::Clone { .. }
                | PromoteError::Stage { .. }
                | PromoteError::Commit { .. }
                | PromoteError::Push { .. } => ErrorKind::GitTransport,
            },
        }
    }

    /// The error and its sources on one line.
    pub fn message(self) -> String {
        let chain = format!("{:#}", anyhow::Error::new(self));
        chain
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn exit_codes() {
        assert_eq!(ErrorKind::Argument.exit_code(), -1);
        assert_eq!(ErrorKind::Config.exit_code(), -1);
        assert_eq!(ErrorKind::TargetNotFound.exit_code(), -2);
        assert_eq!(ErrorKind::UnidentifiedBuild.exit_code(), -3);
        assert_eq!(ErrorKind::DescriptorNotFound.exit_code(), -4);
        assert_eq!(ErrorKind::Credential.exit_code(), -4);
        assert_eq!(ErrorKind::GitTransport.exit_code(), -4);
        assert_eq!(ErrorKind::Filesystem.exit_code(), -4);
    }

    #[test]
    fn credential_message_includes_io_cause() {
        let err = PromotionError::from(PromoteError::Credential(
            buildtools_git::CredentialError::KeyUnreadable {
                path: PathBuf::from("/missing/key"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            },
        ));
        assert_eq!(err.kind(), ErrorKind::Credential);
        assert_eq!(err.message(), "ssh key: open /missing/key: no such file");
    }

    #[test]
    fn invalid_destination_is_filesystem() {
        let err = PromotionError::from(PromoteError::InvalidDestination {
            destination: "../web".to_owned(),
        });
        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert_eq!(err.message(), "destination '../web' leaves the repository");
    }

    #[test]
    fn multi_line_sources_collapse() {
        let err = PromotionError::from(PromoteError::Scratch {
            source: std::io::Error::other("disk full\nretry later"),
        });
        assert_eq!(
            err.message(),
            "failed to create scratch directory: disk full; retry later"
        );
    }

    #[test]
    fn clone_failure_is_transport() {
        let err = PromotionError::from(PromoteError::Clone {
            url: "/missing/repo".to_owned(),
            source: buildtools_git::GitError::CommandFailed {
                args: vec!["clone".to_owned()],
                stderr: "fatal: repository '/missing/repo' does not exist\n".to_owned(),
            },
        });
        assert_eq!(err.kind(), ErrorKind::GitTransport);
        assert_eq!(
            err.message(),
            "failed to clone /missing/repo: git clone failed: \
             fatal: repository '/missing/repo' does not exist"
        );
    }
}
