//! Serves report assets from a local directory that mirrors blob storage.
//!
//! A blob URL such as `https://acct.blob.core.windows.net/reports/a.jpg` is
//! looked up as `<root>/reports/a.jpg`. Resolved paths must stay inside the
//! root directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use towerdoc_traits::{ResourceError, ResourceProvider, SharedResourceData, blob_path};
use towerdoc_types::ResourceUri;

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let canonical_root = root.canonicalize().ok();
        Self {
            root,
            canonical_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `None` when the path would escape the root directory.
    fn resolve(&self, uri: &ResourceUri) -> Option<PathBuf> {
        let relative = blob_path(uri);
        if relative.is_empty() || Path::new(relative).is_absolute() {
            return None;
        }
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        let full_path = self.root.join(relative);
        match (full_path.canonicalize(), &self.canonical_root) {
            (Ok(canonical), Some(root)) if !canonical.starts_with(root) => {
                log::warn!("Blocked resource outside asset root: {}", uri);
                None
            }
            (Ok(canonical), _) => Some(canonical),
            (Err(_), _) => Some(full_path),
        }
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, uri: &ResourceUri) -> Result<SharedResourceData, ResourceError> {
        let path = self
            .resolve(uri)
            .ok_or_else(|| ResourceError::NotFound(format!("{} (outside asset root)", uri)))?;

        std::fs::read(&path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(uri.to_string())
            } else {
                ResourceError::LoadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, uri: &ResourceUri) -> bool {
        self.resolve(uri).is_some_and(|p| p.is_file())
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}
