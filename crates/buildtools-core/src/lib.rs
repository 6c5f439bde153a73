//! Core types and configuration for buildtools.
//!
//! This crate defines the `.buildtools.yaml` schema ([`BuildToolsConfig`]),
//! CI metadata detection ([`CiMetadata`]), the [`BuildIdentity`] that is
//! promoted, and the explicit [`BuildContext`] every entry point receives.

pub mod ci;
pub mod config;
pub mod context;
pub mod error;

pub use ci::{BuildIdentity, BuildMetadata, CiKind, CiMetadata, VcsInfo};
pub use config::{BuildToolsConfig, CiConfig, GitConfig, GitOpsEndpoint, CONFIG_FILE_NAME};
pub use context::BuildContext;
pub use error::{Error, Result};
