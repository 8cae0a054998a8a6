//! Image loading utilities for texture data
//!
//! [`TextureImage::decode`] picks a decode path from the file's magic number:
//! DDS containers keep their compressed blocks, PNG/JPEG/BMP go through the
//! `image` crate and come out as RGBA8.

use std::path::Path;
use image::ImageFormat;
use crate::assets::AssetError;
use crate::assets::dds::{self, DdsImage};

/// Loaded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image from bytes: {e}")))?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Loaded image {}x{} from memory", width, height);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid color image (useful for testing and defaults)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            data: color.repeat(pixel_count(width, height)),
            width,
            height,
        }
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// A texture image in whichever form its container stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureImage {
    /// Block-compressed levels from a DDS container
    Compressed(DdsImage),
    /// Uncompressed RGBA8 pixels
    Rgba(ImageData),
}

impl TextureImage {
    /// Decode texture bytes, choosing the decoder by magic number
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        if dds::is_dds(bytes) {
            return DdsImage::decode(bytes).map(Self::Compressed);
        }
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp) => {
                ImageData::from_bytes(bytes).map(Self::Rgba)
            }
            Ok(other) => Err(AssetError::UnsupportedFormat(format!("{other:?} textures"))),
            Err(_) => {
                let magic: Vec<String> = bytes.iter().take(4).map(|b| format!("{b:02x}")).collect();
                Err(AssetError::UnrecognizedFormat(format!("magic bytes [{}]", magic.join(" "))))
            }
        }
    }

    /// Read and decode a texture file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let bytes = super::read_bytes(path.as_ref())?;
        let image = Self::decode(&bytes)?;
        let (width, height) = image.dimensions();
        log::info!("Loaded texture {}x{} from {:?}", width, height, path.as_ref());
        Ok(image)
    }

    /// Base level size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Compressed(dds) => (dds.width, dds.height),
            Self::Rgba(image) => (image.width, image.height),
        }
    }
}
