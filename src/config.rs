// src/config.rs
use crate::error::ReportError;
use crate::toc_page::LeaderMetrics;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use towerdoc_layout::{Margins, PageGeometry, PageSize};
use towerdoc_types::ResourceUri;

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "images/placeholder.png";

/// Settings shared by every render a compositor performs.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositorConfig {
    pub page_size: PageSize,
    pub margins: Margins,
    pub base_font_size: f32,
    /// Substituted for missing or unreadable images.
    pub placeholder_image: ResourceUri,
    /// Overrides the leader metrics derived from the font size and page width.
    pub leader: Option<LeaderMetrics>,
    pub show_page_footers: bool,
    /// Prefix of the PDF title; the site code and name follow it.
    pub title_prefix: String,
    /// Whether the front page, author page and table of contents also count
    /// redline pages in their captured labels.
    pub offset_front_matter: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            margins: Margins::default(),
            base_font_size: 10.0,
            placeholder_image: ResourceUri::new(DEFAULT_PLACEHOLDER_IMAGE),
            leader: None,
            show_page_footers: true,
            title_prefix: "Tower Inspection Report".to_string(),
            offset_front_matter: false,
        }
    }
}

impl CompositorConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ReportError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            ReportError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read config from '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.base_font_size.is_nan() || self.base_font_size <= 0.0 {
            return Err(ReportError::Config(format!(
                "baseFontSize must be positive, got {}",
                self.base_font_size
            )));
        }
        let geometry = self.geometry();
        let content = geometry.content_rect();
        if content.width <= 0.0 || content.height <= 0.0 {
            return Err(ReportError::Config(
                "margins leave no room for content on the page".to_string(),
            ));
        }
        if self.placeholder_image.is_blank() {
            return Err(ReportError::Config("placeholderImage must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn geometry(&self) -> PageGeometry {
        let geometry = PageGeometry::new(self.page_size, self.margins);
        if self.show_page_footers {
            geometry
        } else {
            geometry.with_footer_height(0.0)
        }
    }

    /// The configured leader metrics, or ones derived from the TOC font size
    /// and the content width.
    pub fn leader_metrics(&self) -> LeaderMetrics {
        self.leader.unwrap_or_else(|| {
            LeaderMetrics::for_font(self.base_font_size * 1.1, self.geometry().content_rect().width)
        })
    }
}
