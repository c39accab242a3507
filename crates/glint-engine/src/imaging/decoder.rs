use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use crate::device::TextureTarget;

/// Pixels plus the target they should be uploaded as.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: RgbaImage,
    pub target: TextureTarget,
}

impl DecodedImage {
    /// Wraps an image, picking `D1` for single-row images and `D2` otherwise.
    pub fn from_rgba(image: RgbaImage) -> Self {
        let target = if image.height() == 1 {
            TextureTarget::D1
        } else {
            TextureTarget::D2
        };
        Self { image, target }
    }
}

/// Errors produced while decoding an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No registered decoder handles the file extension.
    #[error("no decoder for '{name}'")]
    Unsupported { name: String },

    /// The file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The raster data is corrupt or in an unsupported encoding.
    #[error("cannot decode '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The SVG document could not be parsed or rasterized.
    #[error("cannot render '{}': {message}", path.display())]
    Svg { path: PathBuf, message: String },
}

impl DecodeError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An image format backend.
pub trait ImageDecoder {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Lowercase file extensions (without the dot) this decoder accepts.
    fn extensions(&self) -> &[&'static str];

    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}
