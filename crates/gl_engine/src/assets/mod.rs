//! Asset loading and decoding
//!
//! Files are read whole and decoded on the CPU. The render core only ever
//! sees flat vertex/index/float arrays and decoded texture images.

pub mod obj_loader;
pub mod image_loader;
pub mod dds;

pub use obj_loader::{ObjLoader, MeshData};
pub use image_loader::{ImageData, TextureImage};
pub use dds::{BlockFormat, DdsImage};

use std::path::Path;
use thiserror::Error;

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to read asset
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Failed to decode asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Magic number not recognized by any decode path
    #[error("Unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// Recognized container with unsupported contents
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

fn map_io(path: &Path, source: std::io::Error) -> AssetError {
    if source.kind() == std::io::ErrorKind::NotFound {
        AssetError::NotFound(path.display().to_string())
    } else {
        AssetError::Io { path: path.display().to_string(), source }
    }
}

/// Read a whole text file
pub fn read_text(path: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| map_io(path, e))?;
    log::debug!("Read {} bytes of text from {:?}", text.len(), path);
    Ok(text)
}

/// Read a whole binary file
pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| map_io(path, e))?;
    log::debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(bytes)
}
