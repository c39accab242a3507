use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resampling quality for thumbnails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ThumbnailQuality {
    /// Nearest-neighbour.
    Fast,
    /// Bilinear.
    Smooth,
}

impl ThumbnailQuality {
    fn filter(self) -> FilterType {
        match self {
            ThumbnailQuality::Fast => FilterType::Nearest,
            ThumbnailQuality::Smooth => FilterType::Triangle,
        }
    }
}

/// Dimensions of `(width, height)` fitted into a `size x size` box.
///
/// The longer edge becomes exactly `size`; the shorter edge keeps the aspect
/// ratio (truncated, at least 1). Small images are scaled up.
pub fn thumbnail_size(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width == 0 || height == 0 || size == 0 {
        return (0, 0);
    }

    let fit = |short: u32, long: u32| -> u32 {
        let scaled = u64::from(short) * u64::from(size) / u64::from(long);
        (scaled as u32).clamp(1, size)
    };

    if width >= height {
        (size, fit(height, width))
    } else {
        (fit(width, height), size)
    }
}

/// Downsamples (or upsamples) `image` into a `size x size` box.
pub fn thumbnail(image: &RgbaImage, size: u32, quality: ThumbnailQuality) -> RgbaImage {
    let (w, h) = thumbnail_size(image.width(), image.height(), size);
    if w == 0 || h == 0 {
        return RgbaImage::new(0, 0);
    }
    imageops::resize(image, w, h, quality.filter())
}
