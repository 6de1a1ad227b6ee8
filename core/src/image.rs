//! Image decoding delegate.
//!
//! Texture pixel decoding is delegated to an [`ImageDecoder`]
//! implementation supplied by the host. Documents keep at most one live
//! decoder at a time through [`DecoderSlot`]: asking for the same image id
//! twice reuses the decoder, asking for a different id discards it and
//! builds a fresh one. A failed setup leaves the slot empty but remembers
//! the id, so repeated queries for a broken image fail without re-running
//! (and re-logging) the whole setup.

use thiserror::Error;

/// Pixel format of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit single channel.
    R8,
    /// 8-bit two channel.
    Rg8,
    /// 8-bit RGB.
    Rgb8,
    /// 8-bit RGBA.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn pixel_size(&self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// One decoded mip level.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Tightly packed pixel rows.
    pub data: Vec<u8>,
}

/// Errors reported by an [`ImageDecoder`].
#[derive(Debug, Error)]
pub enum ImageError {
    /// The byte stream or file could not be opened as an image.
    #[error("failed to open image: {0}")]
    Open(String),
    /// The opened image could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// The requested mip level does not exist.
    #[error("image has no level {0}")]
    UnsupportedLevel(u32),
}

/// Decodes image files into pixel data. Implementations open one file at
/// a time; `open_*` resets any previously opened file.
pub trait ImageDecoder {
    /// Open an image from an in-memory byte range.
    fn open_data(&mut self, data: &[u8]) -> Result<(), ImageError>;

    /// Open an image from a file path.
    fn open_file(&mut self, path: &str) -> Result<(), ImageError>;

    /// Number of images in the opened file. Translators require exactly
    /// one.
    fn image_count(&self) -> u32;

    /// Number of mip levels of the opened image.
    fn level_count(&self) -> u32;

    /// Decode one mip level.
    fn decode(&mut self, level: u32) -> Result<DecodedImage, ImageError>;
}

/// Single-slot decoder memoization, keyed by image id.
#[derive(Default)]
pub(crate) struct DecoderSlot<D> {
    id: Option<u32>,
    decoder: Option<D>,
}

impl<D> DecoderSlot<D> {
    pub(crate) fn new() -> Self {
        Self {
            id: None,
            decoder: None,
        }
    }

    /// Return the decoder for `id`, building it with `setup` on a slot
    /// miss. `None` means the setup failed, either now or on a previous
    /// query for the same id.
    pub(crate) fn setup_or_reuse(
        &mut self,
        id: u32,
        setup: impl FnOnce() -> Option<D>,
    ) -> Option<&mut D> {
        if self.id == Some(id) {
            return self.decoder.as_mut();
        }
        self.decoder = None;
        self.id = Some(id);
        if let Some(decoder) = setup() {
            self.decoder = Some(decoder);
        }
        self.decoder.as_mut()
    }
}

/// Default decoder backed by the `image` crate. Decodes everything to
/// RGBA8 and exposes a single mip level.
#[cfg(feature = "image")]
#[derive(Default)]
pub struct DefaultImageDecoder {
    image: Option<image::RgbaImage>,
}

#[cfg(feature = "image")]
impl DefaultImageDecoder {
    /// Create a decoder with no opened image.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "image")]
impl ImageDecoder for DefaultImageDecoder {
    fn open_data(&mut self, data: &[u8]) -> Result<(), ImageError> {
        let decoded = image::load_from_memory(data).map_err(|e| ImageError::Open(e.to_string()))?;
        self.image = Some(decoded.to_rgba8());
        Ok(())
    }

    fn open_file(&mut self, path: &str) -> Result<(), ImageError> {
        let decoded = image::open(path).map_err(|e| ImageError::Open(e.to_string()))?;
        self.image = Some(decoded.to_rgba8());
        Ok(())
    }

    fn image_count(&self) -> u32 {
        u32::from(self.image.is_some())
    }

    fn level_count(&self) -> u32 {
        1
    }

    fn decode(&mut self, level: u32) -> Result<DecodedImage, ImageError> {
        if level != 0 {
            return Err(ImageError::UnsupportedLevel(level));
        }
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| ImageError::Decode("no image opened".into()))?;
        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            format: PixelFormat::Rgba8,
            data: image.as_raw().clone(),
        })
    }
}
