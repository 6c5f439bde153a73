//! Target file resolution and descriptor rendering for buildtools.
//!
//! # Override-by-suffix
//!
//! ```text
//! k8s/
//!   deploy.yaml          default, used for every target without an override
//!   deploy-prod.yaml     replaces deploy.yaml when promoting to `prod`
//!   config-staging.yaml  only used for `staging`
//!   service.yaml         default, no overrides
//! ```
//!
//! For target `prod` the resolved set is `deploy-prod.yaml, service.yaml`;
//! for `staging` it is `config-staging.yaml, deploy.yaml, service.yaml`.
//! The same rules apply to `.sh` hook scripts.
//!
//! # Descriptors
//!
//! Descriptor content is opaque. Rendering only substitutes the
//! `${COMMIT}` placeholder with the artifact reference being promoted.

pub mod descriptor;
pub mod target;

pub use descriptor::{Descriptor, DescriptorSet, COMMIT_PLACEHOLDER};
pub use target::{find_files_for_target, find_scripts_for_target, files_for_target, FileKind, TargetFile};

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("failed to read directory {path}")]
    ReadDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}")]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    WriteFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
