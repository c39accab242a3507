//! Glint engine crate.
//!
//! This crate owns the GPU-facing pieces of the shader editor: device
//! bootstrap, image decoding, and the shared texture cache used by the
//! preview and parameter panels.

pub mod device;
pub mod imaging;
pub mod texture;

pub mod logging;
