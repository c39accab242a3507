/// Texture cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Edge of the square box thumbnails are fitted into.
    pub thumbnail_size: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { thumbnail_size: 16 }
    }
}
