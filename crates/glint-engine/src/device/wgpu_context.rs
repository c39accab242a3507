use std::collections::HashMap;

use crate::imaging::DecodedImage;

use super::{Gpu, GpuContext, GpuError, SamplerState, TextureId, TextureTarget};

/// GPU-side state of one texture id.
struct Slot {
    /// Storage; `None` until the first upload.
    storage: Option<Storage>,
    sampler_state: SamplerState,
    sampler: wgpu::Sampler,
}

struct Storage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// [`GpuContext`] backed by a wgpu device.
///
/// wgpu has no mutable sampler objects attached to textures, so the sampler
/// state is stored per id and the `wgpu::Sampler` is rebuilt on change.
pub struct WgpuContext {
    gpu: Gpu,
    next_id: u32,
    slots: HashMap<TextureId, Slot>,
}

impl WgpuContext {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            next_id: 1,
            slots: HashMap::new(),
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Number of ids currently allocated.
    pub fn texture_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the view for binding `id`, if it has been uploaded.
    pub fn view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.slots
            .get(&id)
            .and_then(|s| s.storage.as_ref())
            .map(|s| &s.view)
    }

    /// Returns the sampler for binding `id`.
    pub fn sampler(&self, id: TextureId) -> Option<&wgpu::Sampler> {
        self.slots.get(&id).map(|s| &s.sampler)
    }

    fn create_sampler(&self, state: &SamplerState) -> wgpu::Sampler {
        self.gpu
            .device()
            .create_sampler(&state.descriptor(Some("glint texture sampler")))
    }

    fn dimension_limit(&self, target: TextureTarget) -> u32 {
        let limits = self.gpu.device().limits();
        match target {
            TextureTarget::D1 => limits.max_texture_dimension_1d,
            TextureTarget::D2 => limits.max_texture_dimension_2d,
        }
    }
}

impl GpuContext for WgpuContext {
    fn create_texture(&mut self) -> Result<TextureId, GpuError> {
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or(GpuError::OutOfIds)?;

        let sampler_state = SamplerState::default();
        let sampler = self.create_sampler(&sampler_state);
        self.slots.insert(
            id,
            Slot {
                storage: None,
                sampler_state,
                sampler,
            },
        );
        Ok(id)
    }

    fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), GpuError> {
        if !self.slots.contains_key(&id) {
            return Err(GpuError::UnknownTexture(id));
        }

        let (width, height) = image.image.dimensions();
        if width == 0 || height == 0 {
            return Err(GpuError::EmptyTexture(id));
        }

        let limit = self.dimension_limit(image.target);
        if width > limit || height > limit {
            return Err(GpuError::TextureTooLarge {
                width,
                height,
                limit,
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("glint texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: image.target.dimension(),
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Re-uploads replace the previous storage; the old texture is freed on drop.
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.storage = Some(Storage { texture, view });
        }
        Ok(())
    }

    fn sampler_state(&self, id: TextureId) -> Result<SamplerState, GpuError> {
        self.slots
            .get(&id)
            .map(|s| s.sampler_state)
            .ok_or(GpuError::UnknownTexture(id))
    }

    fn set_sampler_state(&mut self, id: TextureId, state: SamplerState) -> Result<(), GpuError> {
        let current = self.sampler_state(id)?;
        if current == state {
            return Ok(());
        }

        let sampler = self.create_sampler(&state);
        let slot = self.slots.get_mut(&id).ok_or(GpuError::UnknownTexture(id))?;
        slot.sampler_state = state;
        slot.sampler = sampler;
        Ok(())
    }

    fn delete_texture(&mut self, id: TextureId) {
        if let Some(slot) = self.slots.remove(&id) {
            if let Some(storage) = slot.storage {
                storage.texture.destroy();
            }
        }
    }
}
