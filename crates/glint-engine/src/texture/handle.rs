use std::fmt;
use std::rc::{Rc, Weak};

use image::RgbaImage;

use crate::device::{
    FilterMode, GpuContext, GpuError, SamplerState, TextureId, TextureTarget, WrapMode,
};

use super::cache::Shared;
use super::TextureError;

/// One GPU resource and its decoded pixels, shared by every handle to it.
pub(crate) struct Record<C: GpuContext> {
    /// `None` for placeholder textures, which are never cached.
    pub(crate) name: Option<String>,
    pub(crate) id: TextureId,
    pub(crate) target: TextureTarget,
    pub(crate) icon: RgbaImage,
    pub(crate) image: RgbaImage,
    pub(crate) shared: Weak<Shared<C>>,
}

impl<C: GpuContext> Record<C> {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<placeholder>")
    }
}

impl<C: GpuContext> Drop for Record<C> {
    fn drop(&mut self) {
        // Cache already gone: its teardown released the resource.
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        if let Some(name) = &self.name {
            let mut entries = shared.entries.borrow_mut();
            if entries.get(name).is_some_and(|w| w.strong_count() == 0) {
                entries.remove(name);
            }
        }

        // Dropped inside `TextureCache::with_context`: the id stays live and
        // teardown releases it.
        let Ok(mut context) = shared.context.try_borrow_mut() else {
            log::warn!(
                "texture {} {:?} dropped while the context is borrowed; release deferred",
                self.id,
                self.label()
            );
            return;
        };

        // Not live any more when the cache was torn down before this drop.
        let was_live = shared.live.borrow_mut().remove(&self.id);
        if !was_live {
            return;
        }

        if let Some(ctx) = context.as_mut() {
            ctx.delete_texture(self.id);
        }
        log::debug!("released texture {} {:?}", self.id, self.label());
    }
}

/// Reference-counted handle to a cached texture.
///
/// Cloning is cheap and shares the underlying resource. The GPU resource is
/// released (and the cache entry removed) when the last clone is dropped.
///
/// Handles are not `Send`: they must stay on the thread that owns the cache's
/// GPU context.
pub struct Texture<C: GpuContext> {
    record: Rc<Record<C>>,
}

impl<C: GpuContext> Texture<C> {
    pub(crate) fn from_record(record: Rc<Record<C>>) -> Self {
        Self { record }
    }

    /// Cache key, or `None` for placeholder textures.
    pub fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }

    pub fn id(&self) -> TextureId {
        self.record.id
    }

    pub fn target(&self) -> TextureTarget {
        self.record.target
    }

    /// Small preview image for lists and parameter panels.
    pub fn icon(&self) -> &RgbaImage {
        &self.record.icon
    }

    /// Full decoded image.
    pub fn image(&self) -> &RgbaImage {
        &self.record.image
    }

    /// Dimensions of the full image.
    pub fn size(&self) -> (u32, u32) {
        self.record.image.dimensions()
    }

    /// Number of live handles sharing this texture, including `self`.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.record)
    }

    /// Whether both handles refer to the same resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }

    pub fn sampler_state(&self) -> Result<SamplerState, TextureError> {
        self.with_context(|ctx, id| ctx.sampler_state(id))
    }

    pub fn wrap_s(&self) -> Result<WrapMode, TextureError> {
        Ok(self.sampler_state()?.wrap_s)
    }

    pub fn wrap_t(&self) -> Result<WrapMode, TextureError> {
        Ok(self.sampler_state()?.wrap_t)
    }

    pub fn set_wrap_mode(&self, s: WrapMode, t: WrapMode) -> Result<(), TextureError> {
        self.with_context(|ctx, id| {
            let state = ctx.sampler_state(id)?;
            ctx.set_sampler_state(
                id,
                SamplerState {
                    wrap_s: s,
                    wrap_t: t,
                    ..state
                },
            )
        })
    }

    pub fn min_filter(&self) -> Result<FilterMode, TextureError> {
        Ok(self.sampler_state()?.min_filter)
    }

    pub fn mag_filter(&self) -> Result<FilterMode, TextureError> {
        Ok(self.sampler_state()?.mag_filter)
    }

    pub fn set_filtering_mode(&self, min: FilterMode, mag: FilterMode) -> Result<(), TextureError> {
        self.with_context(|ctx, id| {
            let state = ctx.sampler_state(id)?;
            ctx.set_sampler_state(
                id,
                SamplerState {
                    min_filter: min,
                    mag_filter: mag,
                    ..state
                },
            )
        })
    }

    /// Runs `f` against the owning cache's context.
    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut C, TextureId) -> Result<R, GpuError>,
    ) -> Result<R, TextureError> {
        let shared = self.record.shared.upgrade().ok_or(TextureError::ContextLost)?;
        let mut guard = shared.context.borrow_mut();
        let ctx = guard.as_mut().ok_or(TextureError::ContextLost)?;
        let out = f(ctx, self.record.id)?;
        Ok(out)
    }
}

impl<C: GpuContext> Clone for Texture<C> {
    fn clone(&self) -> Self {
        Self {
            record: Rc::clone(&self.record),
        }
    }
}

impl<C: GpuContext> fmt::Debug for Texture<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.record.name)
            .field("id", &self.record.id)
            .field("target", &self.record.target)
            .field("size", &self.size())
            .field("refs", &self.ref_count())
            .finish()
    }
}
