use std::fmt;

use crate::imaging::DecodedImage;

use super::{GpuError, SamplerState};

/// Opaque handle to a texture resource owned by a [`GpuContext`].
///
/// Ids are allocated by the context and are never reused within its lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    /// Wraps a raw id. Intended for [`GpuContext`] implementations.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dimensionality a texture is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureTarget {
    D1,
    D2,
}

impl TextureTarget {
    pub fn dimension(self) -> wgpu::TextureDimension {
        match self {
            TextureTarget::D1 => wgpu::TextureDimension::D1,
            TextureTarget::D2 => wgpu::TextureDimension::D2,
        }
    }
}

impl fmt::Display for TextureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureTarget::D1 => f.write_str("1D"),
            TextureTarget::D2 => f.write_str("2D"),
        }
    }
}

/// Texture allocation and sampler primitives of a GPU context.
///
/// All calls assume the context is current on the calling thread. The
/// texture cache owns its context, so this holds for as long as the cache
/// has not been torn down.
pub trait GpuContext {
    /// Reserves a new texture id without allocating storage.
    fn create_texture(&mut self) -> Result<TextureId, GpuError>;

    /// Allocates storage for `id` and uploads the decoded pixels.
    fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), GpuError>;

    /// Reads the sampler state attached to `id`.
    fn sampler_state(&self, id: TextureId) -> Result<SamplerState, GpuError>;

    /// Replaces the sampler state attached to `id`.
    fn set_sampler_state(&mut self, id: TextureId, state: SamplerState) -> Result<(), GpuError>;

    /// Releases the resource. Unknown ids are ignored.
    fn delete_texture(&mut self, id: TextureId);
}
