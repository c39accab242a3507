//! Image decoding.
//!
//! Decoders are plugins selected by file extension through a
//! [`DecoderRegistry`]. Every decoder produces straight-alpha RGBA8 pixels and
//! the texture target the image should be bound as.

mod decoder;
mod placeholder;
mod raster;
mod registry;
mod svg;
mod thumbnail;

pub use decoder::{DecodeError, DecodedImage, ImageDecoder};
pub use placeholder::placeholder_image;
pub use raster::RasterDecoder;
pub use registry::DecoderRegistry;
pub use svg::SvgDecoder;
pub use thumbnail::{thumbnail, thumbnail_size, ThumbnailQuality};
