use std::path::{Path, PathBuf};

use crate::{FilesError, TargetFile};

/// Placeholder replaced with the artifact reference when rendering.
pub const COMMIT_PLACEHOLDER: &str = "${COMMIT}";

/// A deployment descriptor: file name plus opaque content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub content: Vec<u8>,
}

/// Descriptors resolved for one target, unique by name and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    pub fn new(mut descriptors: Vec<Descriptor>) -> Self {
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors.dedup_by(|a, b| a.name == b.name);
        Self { descriptors }
    }

    /// Read the content of each resolved file.
    pub fn load(files: &[TargetFile]) -> Result<Self, FilesError> {
        let descriptors = files
            .iter()
            .map(|file| {
                let content = std::fs::read(&file.path).map_err(|e| FilesError::ReadFile {
                    path: file.path.clone(),
                    source: e,
                })?;
                Ok(Descriptor {
                    name: file.name.clone(),
                    content,
                })
            })
            .collect::<Result<Vec<_>, FilesError>>()?;
        Ok(Self::new(descriptors))
    }

    /// Substitute [`COMMIT_PLACEHOLDER`] with `artifact_ref` in every descriptor.
    pub fn render(&self, artifact_ref: &str) -> Self {
        let descriptors = self
            .descriptors
            .iter()
            .map(|d| Descriptor {
                name: d.name.clone(),
                content: replace_all(
                    &d.content,
                    COMMIT_PLACEHOLDER.as_bytes(),
                    artifact_ref.as_bytes(),
                ),
            })
            .collect();
        Self { descriptors }
    }

    /// Write every descriptor into `dir`, creating it if needed and
    /// overwriting same-named files. Returns the written paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, FilesError> {
        std::fs::create_dir_all(dir).map_err(|e| FilesError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut written = Vec::with_capacity(self.descriptors.len());
        for descriptor in &self.descriptors {
            let path = dir.join(&descriptor.name);
            std::fs::write(&path, &descriptor.content).map_err(|e| FilesError::WriteFile {
                path: path.clone(),
                source: e,
            })?;
            tracing::debug!(path = %path.display(), "wrote descriptor");
            written.push(path);
        }
        Ok(written)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = rest.windows(needle.len()).position(|w| w == needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
