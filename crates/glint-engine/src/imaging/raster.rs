use std::path::Path;

use super::{DecodeError, DecodedImage, ImageDecoder};

/// Raster formats handled by the `image` crate.
///
/// The format is sniffed from the file contents, so a mislabeled extension
/// still decodes as long as the extension routes the file here.
#[derive(Debug, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn extensions(&self) -> &[&'static str] {
        &["png", "jpg", "jpeg", "bmp", "gif", "ico", "tif", "tiff", "webp", "tga"]
    }

    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let bytes = std::fs::read(path).map_err(|e| DecodeError::io(path, e))?;

        let image = match image::ImageFormat::from_path(path) {
            // TGA has no magic number; it can only be picked by extension.
            Ok(image::ImageFormat::Tga) => {
                image::load_from_memory_with_format(&bytes, image::ImageFormat::Tga)
            }
            _ => image::load_from_memory(&bytes),
        }
        .map_err(|source| DecodeError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(DecodedImage::from_rgba(image.to_rgba8()))
    }
}
