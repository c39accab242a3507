//! GPU device + texture context.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (headless)
//! - defining the `GpuContext` contract the texture cache allocates through
//! - the wgpu implementation of that contract

mod context;
mod error;
mod gpu;
mod init;
mod sampler;
mod wgpu_context;

pub use context::{GpuContext, TextureId, TextureTarget};
pub use error::GpuError;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use sampler::{FilterMode, SamplerState, WrapMode};
pub use wgpu_context::WgpuContext;
