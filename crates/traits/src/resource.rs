//! ResourceProvider trait for loading report assets.
//!
//! Report records reference site photos, signatures and redline drawings by
//! URI, usually a blob-storage URL. Providers resolve those URIs to bytes
//! without the compositor knowing where the bytes live.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use towerdoc_types::ResourceUri;

#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Invalid resource format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

/// Shared resource data type (reference-counted bytes).
pub type SharedResourceData = Arc<Vec<u8>>;

/// Loads report assets by URI.
pub trait ResourceProvider: Send + Sync + Debug {
    fn load(&self, uri: &ResourceUri) -> Result<SharedResourceData, ResourceError>;

    fn exists(&self, uri: &ResourceUri) -> bool;

    /// Returns a human-readable name for this provider (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Reduces a resource URI to the storage-relative path providers key on.
///
/// `https://acct.blob.core.windows.net/reports/site/a.jpg?sv=...` becomes
/// `reports/site/a.jpg`; plain relative paths pass through with leading
/// slashes removed.
pub fn blob_path(uri: &ResourceUri) -> &str {
    let raw = uri.as_str().trim();
    let without_query = raw.split(['?', '#']).next().unwrap_or(raw);
    let without_scheme = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
        None => without_query,
    };
    without_scheme.trim_start_matches('/')
}

/// Resources held in memory, keyed by blob path.
///
/// Works anywhere, and is what tests and embedders use to hand images to the
/// compositor directly.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    resources: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `ResourceError::LoadFailed` if the internal lock is poisoned.
    pub fn add(&self, uri: impl Into<ResourceUri>, data: Vec<u8>) -> Result<(), ResourceError> {
        let uri = uri.into();
        let key = blob_path(&uri).to_string();
        let mut resources = self.resources.write().map_err(|_| ResourceError::LoadFailed {
            path: key.clone(),
            message: "resource store lock poisoned".to_string(),
        })?;
        resources.insert(key, Arc::new(data));
        Ok(())
    }

    /// Builder-style variant of [`add`](Self::add) for test setup.
    pub fn with(self, uri: impl Into<ResourceUri>, data: Vec<u8>) -> Result<Self, ResourceError> {
        self.add(uri, data)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.resources.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, uri: &ResourceUri) -> Result<SharedResourceData, ResourceError> {
        let key = blob_path(uri);
        let resources = self.resources.read().map_err(|_| ResourceError::LoadFailed {
            path: key.to_string(),
            message: "resource store lock poisoned".to_string(),
        })?;
        resources
            .get(key)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(uri.to_string()))
    }

    fn exists(&self, uri: &ResourceUri) -> bool {
        self.resources
            .read()
            .map(|r| r.contains_key(blob_path(uri)))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_path_strips_host_and_query() {
        let uri = ResourceUri::from(
            "https://acct.blob.core.windows.net/reports/TX-001/front.jpg?sv=2024&sig=abc",
        );
        assert_eq!(blob_path(&uri), "reports/TX-001/front.jpg");
        assert_eq!(blob_path(&ResourceUri::from("/assets/placeholder.png")), "assets/placeholder.png");
        assert_eq!(blob_path(&ResourceUri::from("photos/a.jpg")), "photos/a.jpg");
        assert_eq!(blob_path(&ResourceUri::from("https://host.only")), "");
    }

    #[test]
    fn in_memory_provider_resolves_urls_to_stored_paths() {
        let provider = InMemoryResourceProvider::new()
            .with("reports/TX-001/front.jpg", b"jpeg".to_vec())
            .unwrap();

        let uri = ResourceUri::from("https://acct.blob.core.windows.net/reports/TX-001/front.jpg");
        assert!(provider.exists(&uri));
        assert_eq!(&*provider.load(&uri).unwrap(), b"jpeg");
    }

    #[test]
    fn in_memory_provider_not_found() {
        let provider = InMemoryResourceProvider::new();
        let result = provider.load(&ResourceUri::from("missing.png"));
        assert!(matches!(result, Err(ResourceError::NotFound(_))));
        assert!(provider.is_empty());
    }

    #[test]
    fn in_memory_provider_overwrite() {
        let provider = InMemoryResourceProvider::new();
        provider.add("a.png", b"original".to_vec()).unwrap();
        provider.add("a.png", b"updated".to_vec()).unwrap();

        assert_eq!(&*provider.load(&ResourceUri::from("a.png")).unwrap(), b"updated");
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn resource_error_display() {
        let err = ResourceError::LoadFailed {
            path: "file.bin".to_string(),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("file.bin"));
        assert!(err.to_string().contains("permission denied"));
    }
}
