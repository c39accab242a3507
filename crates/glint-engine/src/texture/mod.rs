//! Shared, name-keyed texture cache.
//!
//! Panels ask the cache for textures by file name. The first request decodes
//! the image and uploads it; later requests for the same name hand out another
//! reference to the same GPU resource. The resource is released when the last
//! [`Texture`] handle is dropped.

mod cache;
mod config;
mod error;
mod handle;

pub use cache::TextureCache;
pub use config::CacheConfig;
pub use error::TextureError;
pub use handle::Texture;

pub use crate::device::{FilterMode, SamplerState, TextureId, TextureTarget, WrapMode};
