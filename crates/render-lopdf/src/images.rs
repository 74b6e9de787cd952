//! Decoding image bytes into PDF image XObjects.
//!
//! JPEG data is embedded as-is with `DCTDecode`. Everything else the `image`
//! crate can read is flattened onto white and stored as Flate-compressed RGB.

use crate::error::RenderError;
use image::{ColorType, GenericImageView, ImageFormat};
use lopdf::{Stream, dictionary};
use std::collections::HashMap;
use std::sync::Arc;
use towerdoc_types::{ResourceUri, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Dct,
    RawRgb,
}

/// An image ready to be written as an XObject.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    color_space: &'static str,
    encoding: Encoding,
    data: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn is_passthrough(&self) -> bool {
        self.encoding == Encoding::Dct
    }

    pub(crate) fn to_stream(&self) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
        };
        match self.encoding {
            Encoding::Dct => {
                dict.set("Filter", "DCTDecode");
                Stream::new(dict, self.data.as_ref().clone())
            }
            Encoding::RawRgb => {
                let mut stream = Stream::new(dict, self.data.as_ref().clone());
                if let Err(e) = stream.compress() {
                    log::debug!("Image stream left uncompressed: {}", e);
                }
                stream
            }
        }
    }
}

/// Decodes `bytes`, failing for empty, truncated, or unsupported data.
pub fn prepare_image(uri: &ResourceUri, bytes: &[u8]) -> Result<PreparedImage, RenderError> {
    let fail = |message: String| RenderError::Image {
        uri: uri.to_string(),
        message,
    };
    if bytes.is_empty() {
        return Err(fail("no data".to_string()));
    }
    let format = image::guess_format(bytes).map_err(|e| fail(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| fail(e.to_string()))?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(fail("image has no pixels".to_string()));
    }

    if format == ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => "DeviceGray",
            _ => "DeviceRGB",
        };
        return Ok(PreparedImage {
            width,
            height,
            color_space,
            encoding: Encoding::Dct,
            data: Arc::new(bytes.to_vec()),
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let over_white = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.extend_from_slice(&[over_white(r), over_white(g), over_white(b)]);
    }
    Ok(PreparedImage {
        width,
        height,
        color_space: "DeviceRGB",
        encoding: Encoding::RawRgb,
        data: Arc::new(rgb),
    })
}

/// Decoded images keyed by the URI the layout refers to them by.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: HashMap<ResourceUri, Arc<PreparedImage>>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: ResourceUri, image: PreparedImage) -> Arc<PreparedImage> {
        let image = Arc::new(image);
        self.images.insert(uri, Arc::clone(&image));
        image
    }

    pub fn get(&self, uri: &ResourceUri) -> Option<&Arc<PreparedImage>> {
        self.images.get(uri)
    }

    pub fn contains(&self, uri: &ResourceUri) -> bool {
        self.images.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> ResourceUri {
        ResourceUri::new("photos/front.png")
    }

    #[test]
    fn png_is_flattened_to_rgb() {
        let image = prepare_image(&uri(), &test_images::png(4, 3)).unwrap();
        assert_eq!((image.width, image.height), (4, 3));
        assert!(!image.is_passthrough());
        assert_eq!(image.data.len(), 4 * 3 * 3);
        assert_eq!(&image.data[..3], &[200, 30, 30]);
    }

    #[test]
    fn jpeg_is_passed_through() {
        let bytes = test_images::jpeg(8, 8);
        let image = prepare_image(&uri(), &bytes).unwrap();
        assert!(image.is_passthrough());
        assert_eq!(image.data.as_slice(), bytes.as_slice());
        let stream = image.to_stream();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = prepare_image(&uri(), b"definitely not an image").unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
        assert!(prepare_image(&uri(), &[]).is_err());
    }
}
