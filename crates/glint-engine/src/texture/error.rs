use thiserror::Error;

use crate::device::GpuError;
use crate::imaging::DecodeError;

/// Errors returned by the texture cache and texture handles.
#[derive(Debug, Error)]
pub enum TextureError {
    /// `open` was called with an empty name.
    #[error("texture name is empty")]
    EmptyName,

    /// The cache was torn down; its GPU context is gone.
    #[error("GPU context is no longer available")]
    ContextLost,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}
