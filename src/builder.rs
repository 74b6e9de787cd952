// src/builder.rs
use crate::compositor::Compositor;
use crate::config::CompositorConfig;
use crate::error::ReportError;
use std::path::Path;
use std::sync::Arc;
use towerdoc_layout::{Margins, PageSize};
use towerdoc_resource::FilesystemResourceProvider;
use towerdoc_traits::{InMemoryResourceProvider, ResourceProvider};
use towerdoc_types::ResourceUri;

/// A builder for creating a [`Compositor`].
#[derive(Default)]
pub struct CompositorBuilder {
    config: CompositorConfig,
    provider: Option<Arc<dyn ResourceProvider>>,
}

impl CompositorBuilder {
    /// Creates a builder with the default configuration and no asset source.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: CompositorConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ReportError> {
        self.config = CompositorConfig::from_file(path)?;
        Ok(self)
    }

    /// Where images and redline documents are loaded from.
    pub fn with_resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Loads assets from a directory on disk.
    pub fn with_asset_dir<P: AsRef<Path>>(self, path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ReportError::Config(format!(
                "Asset directory '{}' does not exist",
                path.display()
            )));
        }
        Ok(self.with_resource_provider(Arc::new(FilesystemResourceProvider::new(path))))
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn with_base_font_size(mut self, size: f32) -> Self {
        self.config.base_font_size = size;
        self
    }

    pub fn with_placeholder_image(mut self, uri: impl Into<ResourceUri>) -> Self {
        self.config.placeholder_image = uri.into();
        self
    }

    pub fn with_page_footers(mut self, show: bool) -> Self {
        self.config.show_page_footers = show;
        self
    }

    /// Consumes the builder and creates the `Compositor`.
    pub fn build(self) -> Result<Compositor, ReportError> {
        self.config.validate()?;
        let provider = self.provider.unwrap_or_else(|| {
            log::info!("No resource provider configured; images will use fallbacks.");
            Arc::new(InMemoryResourceProvider::new())
        });
        log::debug!("Building compositor with {} assets.", provider.name());
        Ok(Compositor::new(self.config, provider))
    }
}
