use std::path::Path;

use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use super::{DecodeError, DecodedImage, ImageDecoder};

/// Largest edge an SVG is rasterized to.
const MAX_EDGE: f32 = 4096.0;

/// Rasterizes SVG documents at their intrinsic size via `resvg`.
#[derive(Debug, Default)]
pub struct SvgDecoder;

impl ImageDecoder for SvgDecoder {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn extensions(&self) -> &[&'static str] {
        &["svg"]
    }

    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let data = std::fs::read(path).map_err(|e| DecodeError::io(path, e))?;
        let svg_err = |message: String| DecodeError::Svg {
            path: path.to_path_buf(),
            message,
        };

        let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
            .map_err(|e| svg_err(e.to_string()))?;

        let size = tree.size();
        let scale = (MAX_EDGE / size.width().max(size.height())).min(1.0);
        let width = (size.width() * scale).ceil() as u32;
        let height = (size.height() * scale).ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| svg_err(format!("invalid canvas size {width}x{height}")))?;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        // tiny-skia stores premultiplied alpha; textures expect straight alpha.
        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }

        Ok(DecodedImage::from_rgba(image))
    }
}
