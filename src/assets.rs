//! Resolves report image URIs into decoded images, with fallbacks.
//!
//! An image that cannot be loaded or decoded is replaced by the configured
//! placeholder image. If the placeholder cannot be used either, a grey frame
//! with a caption takes its place. None of these are errors.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use towerdoc_layout::ImageBlock;
use towerdoc_render_lopdf::{ImageSet, prepare_image};
use towerdoc_traits::ResourceProvider;
use towerdoc_types::{ResourceUri, Size};

pub const FRAME_CAPTION: &str = "Image unavailable";

pub struct AssetResolver {
    provider: Arc<dyn ResourceProvider>,
    placeholder: ResourceUri,
    images: ImageSet,
    sizes: HashMap<ResourceUri, Size>,
    failed: HashSet<ResourceUri>,
    referenced: Vec<ResourceUri>,
}

impl AssetResolver {
    pub fn new(provider: Arc<dyn ResourceProvider>, placeholder: ResourceUri) -> Self {
        Self {
            provider,
            placeholder,
            images: ImageSet::new(),
            sizes: HashMap::new(),
            failed: HashSet::new(),
            referenced: Vec::new(),
        }
    }

    /// An image block for `uri`, falling back to the placeholder image and
    /// then to a frame. `None` goes straight to the placeholder.
    pub fn image(&mut self, uri: Option<&ResourceUri>, max_height: f32) -> ImageBlock {
        if let Some(uri) = uri.filter(|u| !u.is_blank()) {
            if let Some(size) = self.load(uri) {
                return self.block(uri.clone(), size, max_height);
            }
            log::debug!("Substituting placeholder for '{}'.", uri);
        }
        self.placeholder(max_height)
    }

    /// The placeholder image, or a captioned frame when it is unavailable.
    pub fn placeholder(&mut self, max_height: f32) -> ImageBlock {
        let placeholder = self.placeholder.clone();
        match self.load(&placeholder) {
            Some(size) => self.block(placeholder, size, max_height),
            None => {
                log::debug!("Placeholder '{}' unavailable; drawing a frame.", placeholder);
                ImageBlock::frame(FRAME_CAPTION, max_height)
            }
        }
    }

    fn block(&mut self, uri: ResourceUri, size: Size, max_height: f32) -> ImageBlock {
        if !self.referenced.contains(&uri) {
            self.referenced.push(uri.clone());
        }
        ImageBlock::new(uri, max_height).with_intrinsic(size)
    }

    fn load(&mut self, uri: &ResourceUri) -> Option<Size> {
        if let Some(size) = self.sizes.get(uri) {
            return Some(*size);
        }
        if self.failed.contains(uri) {
            return None;
        }
        let prepared = self
            .provider
            .load(uri)
            .map_err(|e| e.to_string())
            .and_then(|bytes| prepare_image(uri, &bytes).map_err(|e| e.to_string()));
        match prepared {
            Ok(image) => {
                let size = image.size();
                self.images.insert(uri.clone(), image);
                self.sizes.insert(uri.clone(), size);
                Some(size)
            }
            Err(message) => {
                log::debug!("Image '{}' via {} unusable: {}", uri, self.provider.name(), message);
                self.failed.insert(uri.clone());
                None
            }
        }
    }

    /// Image URIs that ended up in the document, in first-use order.
    pub fn referenced(&self) -> &[ResourceUri] {
        &self.referenced
    }

    pub fn finish(self) -> (ImageSet, Vec<ResourceUri>) {
        (self.images, self.referenced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use towerdoc_traits::InMemoryResourceProvider;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([120u8, 120, 120]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn resolver(provider: InMemoryResourceProvider) -> AssetResolver {
        AssetResolver::new(Arc::new(provider), ResourceUri::new("images/placeholder.png"))
    }

    #[test]
    fn loadable_images_keep_their_uri() {
        let provider = InMemoryResourceProvider::new().with("site/front.png", png(40, 20)).unwrap();
        let mut assets = resolver(provider);
        let block = assets.image(Some(&ResourceUri::new("site/front.png")), 200.0);
        assert_eq!(block.src.as_ref().map(|u| u.as_str()), Some("site/front.png"));
        assert_eq!(block.intrinsic, Some(Size::new(40.0, 20.0)));
    }

    #[test]
    fn broken_images_fall_back_to_the_placeholder() {
        let provider = InMemoryResourceProvider::new()
            .with("site/broken.jpg", b"not really a jpeg".to_vec())
            .unwrap()
            .with("images/placeholder.png", png(8, 8))
            .unwrap();
        let mut assets = resolver(provider);

        let block = assets.image(Some(&ResourceUri::new("site/broken.jpg")), 200.0);
        assert_eq!(block.src.as_ref().map(|u| u.as_str()), Some("images/placeholder.png"));

        let missing = assets.image(None, 200.0);
        assert_eq!(missing.src, block.src);

        let (images, referenced) = assets.finish();
        assert_eq!(images.len(), 1);
        assert_eq!(referenced, vec![ResourceUri::new("images/placeholder.png")]);
    }

    #[test]
    fn missing_placeholder_becomes_a_frame() {
        let mut assets = resolver(InMemoryResourceProvider::new());
        let block = assets.image(Some(&ResourceUri::new("site/gone.png")), 150.0);
        assert!(block.src.is_none());
        assert_eq!(block.caption.as_deref(), Some(FRAME_CAPTION));
        assert!(assets.referenced().is_empty());
    }
}
