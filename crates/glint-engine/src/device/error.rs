use thiserror::Error;

use super::TextureId;

/// Errors reported by a [`GpuContext`](super::GpuContext).
#[derive(Debug, Error)]
pub enum GpuError {
    /// The id was never allocated by this context, or was already deleted.
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),

    /// The image exceeds the device's texture dimension limit.
    #[error("texture {width}x{height} exceeds the device limit of {limit}")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },

    /// Zero-sized images cannot be uploaded.
    #[error("texture {0} has zero size")]
    EmptyTexture(TextureId),

    /// The id space of the context is exhausted.
    #[error("texture ids exhausted")]
    OutOfIds,
}
