use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::device::{GpuContext, TextureId};
use crate::imaging::{thumbnail, DecodedImage, DecoderRegistry, ThumbnailQuality};

use super::handle::Record;
use super::{CacheConfig, Texture, TextureError};

/// State shared between the cache and its records.
///
/// Records hold a `Weak` to this so that dropping the last handle can unlink
/// the cache entry and free the GPU resource.
pub(crate) struct Shared<C: GpuContext> {
    /// `None` once the cache has been torn down.
    pub(crate) context: RefCell<Option<C>>,
    /// Named records. Placeholders never appear here.
    pub(crate) entries: RefCell<HashMap<String, Weak<Record<C>>>>,
    /// Every resource id allocated and not yet released.
    pub(crate) live: RefCell<HashSet<TextureId>>,
}

/// Deduplicating, reference-counted texture cache.
///
/// The cache owns the GPU context. At most one resource exists per name at any
/// time; a name is evicted exactly when the last [`Texture`] for it is dropped.
/// There is no capacity bound.
///
/// Call [`teardown`](Self::teardown) before destroying the device the context
/// belongs to. Dropping the cache tears it down as well.
pub struct TextureCache<C: GpuContext> {
    shared: Rc<Shared<C>>,
    decoders: DecoderRegistry,
    config: CacheConfig,
}

impl<C: GpuContext> TextureCache<C> {
    pub fn new(context: C, decoders: DecoderRegistry, config: CacheConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                context: RefCell::new(Some(context)),
                entries: RefCell::new(HashMap::new()),
                live: RefCell::new(HashSet::new()),
            }),
            decoders,
            config,
        }
    }

    /// A cache with the built-in decoders and default configuration.
    pub fn with_defaults(context: C) -> Self {
        Self::new(context, DecoderRegistry::with_defaults(), CacheConfig::default())
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether the cache still owns its GPU context.
    pub fn is_active(&self) -> bool {
        self.shared.context.borrow().is_some()
    }

    /// Returns the texture for `name`, loading it on first use.
    ///
    /// Decode failures are returned as-is; no placeholder is substituted and
    /// nothing is cached.
    pub fn open(&self, name: &str) -> Result<Texture<C>, TextureError> {
        if name.is_empty() {
            return Err(TextureError::EmptyName);
        }
        if !self.is_active() {
            return Err(TextureError::ContextLost);
        }

        if let Some(record) = self.lookup(name) {
            log::debug!(
                "texture cache hit {name:?} ({} refs)",
                Rc::strong_count(&record)
            );
            return Ok(Texture::from_record(record));
        }

        log::debug!("texture cache miss {name:?}");
        let decoded = self.decoders.decode(name)?;
        self.create(Some(name), decoded, ThumbnailQuality::Smooth)
    }

    /// Creates a fresh placeholder texture.
    ///
    /// Placeholders are not cached: every call allocates a new resource.
    pub fn placeholder(&self) -> Result<Texture<C>, TextureError> {
        if !self.is_active() {
            return Err(TextureError::ContextLost);
        }

        let texture = self.create(None, self.decoders.placeholder(), ThumbnailQuality::Fast)?;
        log::debug!("created placeholder texture {}", texture.id());
        Ok(texture)
    }

    /// Number of names currently cached.
    pub fn len(&self) -> usize {
        self.shared.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shared.entries.borrow().contains_key(name)
    }

    /// Live handles for `name`; 0 when not cached.
    pub fn ref_count(&self, name: &str) -> usize {
        self.shared
            .entries
            .borrow()
            .get(name)
            .map_or(0, Weak::strong_count)
    }

    /// Cached names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.entries.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// GPU resources currently allocated, placeholders included.
    pub fn live_resources(&self) -> usize {
        self.shared.live.borrow().len()
    }

    /// Runs `f` with the GPU context, or returns `None` after teardown.
    ///
    /// A [`Texture`] whose last handle is dropped inside `f` cannot release its
    /// resource while the context is borrowed; the release is deferred to
    /// [`teardown`](Self::teardown).
    pub fn with_context<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.shared.context.borrow().as_ref().map(f)
    }

    /// Releases every live GPU resource and returns the context.
    ///
    /// Outstanding handles keep their CPU-side data but every GPU operation on
    /// them fails with [`TextureError::ContextLost`]. Returns `None` if the
    /// cache was already torn down.
    pub fn teardown(&mut self) -> Option<C> {
        let mut ctx = self.shared.context.borrow_mut().take()?;

        let live: Vec<TextureId> = self.shared.live.borrow_mut().drain().collect();
        if !live.is_empty() {
            log::warn!(
                "texture cache torn down with {} live resource(s), {} named",
                live.len(),
                self.len()
            );
        }
        for id in live {
            ctx.delete_texture(id);
        }

        log::debug!("texture cache torn down");
        Some(ctx)
    }

    fn lookup(&self, name: &str) -> Option<Rc<Record<C>>> {
        let entries = self.shared.entries.borrow();
        entries.get(name).and_then(Weak::upgrade)
    }

    fn create(
        &self,
        name: Option<&str>,
        decoded: DecodedImage,
        quality: ThumbnailQuality,
    ) -> Result<Texture<C>, TextureError> {
        let id = {
            let mut guard = self.shared.context.borrow_mut();
            let ctx = guard.as_mut().ok_or(TextureError::ContextLost)?;
            let id = ctx.create_texture()?;
            if let Err(e) = ctx.upload(id, &decoded) {
                ctx.delete_texture(id);
                return Err(e.into());
            }
            id
        };

        let icon = thumbnail(&decoded.image, self.config.thumbnail_size, quality);
        let record = Rc::new(Record {
            name: name.map(str::to_owned),
            id,
            target: decoded.target,
            icon,
            image: decoded.image,
            shared: Rc::downgrade(&self.shared),
        });

        self.shared.live.borrow_mut().insert(id);
        if let Some(name) = name {
            self.shared
                .entries
                .borrow_mut()
                .insert(name.to_owned(), Rc::downgrade(&record));
        }

        Ok(Texture::from_record(record))
    }
}

impl<C: GpuContext> Drop for TextureCache<C> {
    fn drop(&mut self) {
        drop(self.teardown());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::Path;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::device::{
        FilterMode, GpuError, SamplerState, TextureTarget, WrapMode,
    };
    use crate::imaging::{DecodeError, ImageDecoder};

    /// Records every call so tests can inspect GPU traffic.
    #[derive(Default)]
    struct FakeGpu {
        next: u32,
        allocated: Vec<TextureId>,
        uploaded: HashMap<TextureId, (u32, u32)>,
        samplers: HashMap<TextureId, SamplerState>,
        deleted: Vec<TextureId>,
        fail_uploads: bool,
    }

    impl GpuContext for FakeGpu {
        fn create_texture(&mut self) -> Result<TextureId, GpuError> {
            self.next += 1;
            let id = TextureId::from_raw(self.next);
            self.allocated.push(id);
            self.samplers.insert(id, SamplerState::default());
            Ok(id)
        }

        fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), GpuError> {
            if self.fail_uploads {
                return Err(GpuError::TextureTooLarge {
                    width: image.image.width(),
                    height: image.image.height(),
                    limit: 0,
                });
            }
            self.uploaded.insert(id, image.image.dimensions());
            Ok(())
        }

        fn sampler_state(&self, id: TextureId) -> Result<SamplerState, GpuError> {
            self.samplers.get(&id).copied().ok_or(GpuError::UnknownTexture(id))
        }

        fn set_sampler_state(&mut self, id: TextureId, state: SamplerState) -> Result<(), GpuError> {
            let slot = self.samplers.get_mut(&id).ok_or(GpuError::UnknownTexture(id))?;
            *slot = state;
            Ok(())
        }

        fn delete_texture(&mut self, id: TextureId) {
            self.samplers.remove(&id);
            self.deleted.push(id);
        }
    }

    /// `.png` decoder that counts calls. Names starting with "missing" fail.
    struct CountingDecoder {
        calls: Rc<Cell<usize>>,
    }

    impl ImageDecoder for CountingDecoder {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn extensions(&self) -> &[&'static str] {
            &["png"]
        }

        fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            self.calls.set(self.calls.get() + 1);
            let missing = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("missing"));
            if missing {
                return Err(DecodeError::io(
                    path,
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ));
            }
            Ok(DecodedImage::from_rgba(RgbaImage::from_pixel(8, 4, Rgba([1, 2, 3, 255]))))
        }
    }

    fn cache_with(gpu: FakeGpu) -> (TextureCache<FakeGpu>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let mut decoders = DecoderRegistry::empty();
        decoders.register(CountingDecoder {
            calls: Rc::clone(&calls),
        });
        (TextureCache::new(gpu, decoders, CacheConfig::default()), calls)
    }

    fn cache() -> (TextureCache<FakeGpu>, Rc<Cell<usize>>) {
        cache_with(FakeGpu::default())
    }

    fn allocations(cache: &TextureCache<FakeGpu>) -> usize {
        cache.with_context(|g| g.allocated.len()).unwrap()
    }

    fn deleted(cache: &TextureCache<FakeGpu>) -> Vec<TextureId> {
        cache.with_context(|g| g.deleted.clone()).unwrap()
    }

    // ── open ──────────────────────────────────────────────────────────────

    #[test]
    fn open_twice_shares_one_record() {
        let (cache, _) = cache();
        let a = cache.open("brick.png").unwrap();
        let b = cache.open("brick.png").unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert_eq!(a.target(), b.target());
        assert_eq!(a.image(), b.image());
        assert_eq!(a.ref_count(), 2);
        assert_eq!(cache.ref_count("brick.png"), 2);
    }

    #[test]
    fn brick_scenario() {
        let (cache, calls) = cache();

        let first = cache.open("brick.png").unwrap();
        let id = first.id();
        assert_eq!(calls.get(), 1);
        assert_eq!(allocations(&cache), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ref_count("brick.png"), 1);

        let second = cache.open("brick.png").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(allocations(&cache), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ref_count("brick.png"), 2);

        drop(first);
        assert_eq!(cache.ref_count("brick.png"), 1);
        assert_eq!(cache.len(), 1);
        assert!(deleted(&cache).is_empty());

        drop(second);
        assert_eq!(cache.ref_count("brick.png"), 0);
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains("brick.png"));
        assert_eq!(deleted(&cache), vec![id]);
        assert_eq!(cache.live_resources(), 0);
    }

    #[test]
    fn reopen_after_release_allocates_again() {
        let (cache, calls) = cache();
        let a = cache.open("brick.png").unwrap();
        let b = cache.open("brick.png").unwrap();
        let old = a.id();
        drop(a);
        drop(b);

        let c = cache.open("brick.png").unwrap();
        assert_ne!(c.id(), old);
        assert_eq!(calls.get(), 2);
        assert_eq!(c.ref_count(), 1);
    }

    #[test]
    fn missing_file_leaves_cache_untouched() {
        let (cache, calls) = cache();
        let err = cache.open("missing.png").unwrap_err();

        assert!(
            matches!(err, TextureError::Decode(DecodeError::Io { .. })),
            "{err:?}"
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 0);
        assert_eq!(allocations(&cache), 0);
        assert_eq!(cache.live_resources(), 0);
    }

    #[test]
    fn unsupported_extension_is_a_decode_error() {
        let (cache, _) = cache();
        let err = cache.open("model.obj").unwrap_err();
        assert!(matches!(err, TextureError::Decode(DecodeError::Unsupported { .. })));
    }

    #[test]
    fn empty_name_is_rejected() {
        let (cache, calls) = cache();
        assert!(matches!(cache.open(""), Err(TextureError::EmptyName)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn identity_is_by_name_not_content() {
        let (cache, calls) = cache();
        let a = cache.open("a.png").unwrap();
        let b = cache.open("b.png").unwrap();

        assert_eq!(a.image(), b.image());
        assert_ne!(a.id(), b.id());
        assert!(!a.ptr_eq(&b));
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.names(), vec!["a.png".to_string(), "b.png".to_string()]);
    }

    #[test]
    fn clones_count_as_references() {
        let (cache, _) = cache();
        let a = cache.open("brick.png").unwrap();
        let c = a.clone();
        assert_eq!(cache.ref_count("brick.png"), 2);
        drop(c);
        assert_eq!(cache.ref_count("brick.png"), 1);
        assert!(deleted(&cache).is_empty());
    }

    #[test]
    fn named_texture_has_fitted_icon_and_uploaded_image() {
        let (cache, _) = cache();
        let t = cache.open("brick.png").unwrap();

        assert_eq!(t.name(), Some("brick.png"));
        assert_eq!(t.size(), (8, 4));
        assert_eq!(t.target(), TextureTarget::D2);
        assert_eq!(t.icon().dimensions(), (16, 8));
        assert_eq!(
            cache.with_context(|g| g.uploaded.get(&t.id()).copied()).unwrap(),
            Some((8, 4))
        );
    }

    #[test]
    fn failed_upload_frees_the_allocation() {
        let (cache, _) = cache_with(FakeGpu {
            fail_uploads: true,
            ..FakeGpu::default()
        });

        let err = cache.open("brick.png").unwrap_err();
        assert!(matches!(err, TextureError::Gpu(GpuError::TextureTooLarge { .. })));
        assert_eq!(allocations(&cache), 1);
        assert_eq!(deleted(&cache).len(), 1);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.live_resources(), 0);
    }

    // ── placeholder ───────────────────────────────────────────────────────

    #[test]
    fn placeholders_are_never_shared() {
        let (cache, calls) = cache();
        let p1 = cache.placeholder().unwrap();
        let p2 = cache.placeholder().unwrap();

        assert_ne!(p1.id(), p2.id());
        assert_eq!(p1.image(), p2.image());
        assert_eq!(p1.name(), None);
        assert_eq!(p1.ref_count(), 1);
        assert_eq!(calls.get(), 0);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.live_resources(), 2);
        assert_eq!(p1.icon().dimensions(), (16, 16));
    }

    #[test]
    fn dropping_a_placeholder_releases_it() {
        let (cache, _) = cache();
        let p = cache.placeholder().unwrap();
        let id = p.id();
        drop(p);
        assert_eq!(deleted(&cache), vec![id]);
        assert_eq!(cache.live_resources(), 0);
    }

    #[test]
    fn drop_inside_with_context_defers_release() {
        let (mut cache, _) = cache();
        let named = cache.open("brick.png").unwrap();
        let placeholder = cache.placeholder().unwrap();
        let ids = [named.id(), placeholder.id()];

        cache.with_context(move |_| {
            drop(named);
            drop(placeholder);
        });

        assert!(cache.is_empty());
        assert!(deleted(&cache).is_empty());
        assert_eq!(cache.live_resources(), 2);

        let gpu = cache.teardown().unwrap();
        let mut released = gpu.deleted.clone();
        released.sort();
        assert_eq!(released, ids.to_vec());
    }

    // ── sampler state ─────────────────────────────────────────────────────

    #[test]
    fn sampler_defaults() {
        let (cache, _) = cache();
        let t = cache.open("brick.png").unwrap();
        assert_eq!(t.wrap_s().unwrap(), WrapMode::Repeat);
        assert_eq!(t.wrap_t().unwrap(), WrapMode::Repeat);
        assert_eq!(t.min_filter().unwrap(), FilterMode::Linear);
        assert_eq!(t.mag_filter().unwrap(), FilterMode::Linear);
    }

    #[test]
    fn wrap_and_filter_round_trip() {
        let (cache, _) = cache();
        let t = cache.open("brick.png").unwrap();

        t.set_wrap_mode(WrapMode::ClampToEdge, WrapMode::MirroredRepeat).unwrap();
        t.set_filtering_mode(FilterMode::Nearest, FilterMode::Linear).unwrap();

        assert_eq!(t.wrap_s().unwrap(), WrapMode::ClampToEdge);
        assert_eq!(t.wrap_t().unwrap(), WrapMode::MirroredRepeat);
        assert_eq!(t.min_filter().unwrap(), FilterMode::Nearest);
        assert_eq!(t.mag_filter().unwrap(), FilterMode::Linear);

        let stored = cache.with_context(|g| g.samplers[&t.id()]).unwrap();
        assert_eq!(stored, t.sampler_state().unwrap());
    }

    #[test]
    fn sampler_state_is_shared_by_name() {
        let (cache, _) = cache();
        let a = cache.open("brick.png").unwrap();
        let b = cache.open("brick.png").unwrap();
        a.set_wrap_mode(WrapMode::ClampToEdge, WrapMode::ClampToEdge).unwrap();
        assert_eq!(b.wrap_t().unwrap(), WrapMode::ClampToEdge);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn teardown_releases_named_and_placeholder_resources() {
        let (mut cache, _) = cache();
        let named = cache.open("brick.png").unwrap();
        let placeholder = cache.placeholder().unwrap();

        let gpu = cache.teardown().unwrap();
        let mut released = gpu.deleted.clone();
        released.sort();
        assert_eq!(released, vec![named.id(), placeholder.id()]);
        assert!(!cache.is_active());
        assert_eq!(cache.live_resources(), 0);
    }

    #[test]
    fn operations_after_teardown_report_context_lost() {
        let (mut cache, calls) = cache();
        let t = cache.open("brick.png").unwrap();
        assert!(cache.teardown().is_some());

        assert!(matches!(cache.open("brick.png"), Err(TextureError::ContextLost)));
        assert!(matches!(cache.open("other.png"), Err(TextureError::ContextLost)));
        assert!(matches!(cache.placeholder(), Err(TextureError::ContextLost)));
        assert!(matches!(t.wrap_s(), Err(TextureError::ContextLost)));
        assert!(matches!(
            t.set_filtering_mode(FilterMode::Nearest, FilterMode::Nearest),
            Err(TextureError::ContextLost)
        ));
        assert_eq!(calls.get(), 1);
        assert!(cache.with_context(|_| ()).is_none());

        // CPU-side data survives.
        assert_eq!(t.size(), (8, 4));
        drop(t);
        assert!(cache.is_empty());
        assert!(cache.teardown().is_none());
    }

    #[test]
    fn handles_may_outlive_the_cache() {
        let (cache, _) = cache();
        let t = cache.open("brick.png").unwrap();
        drop(cache);

        assert_eq!(t.name(), Some("brick.png"));
        assert!(matches!(t.sampler_state(), Err(TextureError::ContextLost)));
        drop(t);
    }

    // ── with real decoders ────────────────────────────────────────────────

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        RgbaImage::from_pixel(40, 10, Rgba([9, 9, 9, 255]))
            .save(&path)
            .unwrap();
        let name = path.to_str().unwrap();

        let cache = TextureCache::with_defaults(FakeGpu::default());
        let t = cache.open(name).unwrap();
        assert_eq!(t.size(), (40, 10));
        assert_eq!(t.icon().dimensions(), (16, 4));
        assert!(cache.contains(name));

        let missing = dir.path().join("missing.png");
        let err = cache.open(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, TextureError::Decode(DecodeError::Io { .. })));
        assert_eq!(cache.len(), 1);
    }
}
