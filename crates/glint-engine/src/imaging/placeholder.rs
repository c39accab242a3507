use image::{Rgba, RgbaImage};

const SIZE: u32 = 64;
const CELL: u32 = 8;

const DARK: Rgba<u8> = Rgba([48, 48, 48, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Built-in image bound to textures that have no source file.
///
/// A 64x64 checkerboard of 8px cells, loud enough to spot an unbound sampler
/// in the preview.
pub fn placeholder_image() -> RgbaImage {
    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        if (x / CELL + y / CELL) % 2 == 0 {
            LIGHT
        } else {
            DARK
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_checkerboard() {
        let img = placeholder_image();
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(*img.get_pixel(0, 0), LIGHT);
        assert_eq!(*img.get_pixel(8, 0), DARK);
        assert_eq!(*img.get_pixel(8, 8), LIGHT);
        assert_eq!(*img.get_pixel(63, 0), DARK);
    }

    #[test]
    fn placeholder_is_deterministic() {
        assert_eq!(placeholder_image(), placeholder_image());
    }
}
