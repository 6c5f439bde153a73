pub mod auth;
pub mod client;
pub mod credentials;
pub mod executor;
pub mod git;

pub use auth::SshAuth;
pub use client::{
    destination_path, AuthorIdentity, CommitOutcome, GitClient, PromoteError, PromoteRequest,
};
pub use credentials::{CredentialError, CredentialOverrides, GitCredentials};
pub use executor::{GitExecutor, RealExecutor};
pub use git::GitError;
