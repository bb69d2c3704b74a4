//! Texture context
//!
//! Owns everything the GL-style texture calls touch: descriptor arena, unit
//! table, allocator and frame counter. All calls are made from the render
//! thread, so the context is plain `&mut self` state with no locking.

use crate::allocator::{GpuAllocator, GpuPtr};
use crate::config::{ConfigError, Settings};
use crate::error::TextureError;
use crate::format::TextureFormat;
use crate::frame::{FrameCounter, LastUse};
use crate::handle::{SdkTexture, SoftTexture};
use crate::policy::{ReclamationPolicy, Resolution};
use crate::store::{SlotId, TextureDescriptor, TextureStore, TextureUnits};
use vtex_metrics::{keys, Counter, RingBuffer};

/// Snapshot of context state for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextStats {
    pub frame: u64,
    pub live_textures: usize,
    pub defined_textures: usize,
    /// Bytes held by defined textures' backing stores.
    pub live_bytes: usize,
    /// Backing stores re-acquired since the context was created.
    pub reclaims: u64,
}

pub struct TextureContext<A, H = SoftTexture> {
    policy: ReclamationPolicy,
    store: TextureStore<H>,
    units: TextureUnits,
    allocator: A,
    frames: FrameCounter,
    counters: Counter,
    reclaims: u64,
    reclaimed_this_frame: u64,
    reclaim_window: RingBuffer<u64>,
}

impl<A, H> TextureContext<A, H>
where
    A: GpuAllocator,
    H: SdkTexture + Default,
{
    pub fn new(settings: &Settings, allocator: A) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            policy: ReclamationPolicy::from_settings(settings),
            store: TextureStore::new(),
            units: TextureUnits::new(settings.texture_units),
            allocator,
            frames: FrameCounter::new(),
            counters: Counter::new(),
            reclaims: 0,
            reclaimed_this_frame: 0,
            reclaim_window: RingBuffer::new(settings.metrics_window),
        })
    }

    pub fn policy(&self) -> &ReclamationPolicy {
        &self.policy
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    pub fn current_frame(&self) -> u64 {
        self.frames.current()
    }

    pub fn active_unit(&self) -> usize {
        self.units.active()
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    /// Rolling window of bytes reallocated per frame.
    pub fn reclaim_window(&self) -> &RingBuffer<u64> {
        &self.reclaim_window
    }

    pub fn descriptor(&self, slot: SlotId) -> Result<&TextureDescriptor<H>, TextureError> {
        self.store.get(slot)
    }

    /// Slot bound to the active unit.
    pub fn bound_slot(&self) -> Result<SlotId, TextureError> {
        self.units.bound()
    }

    pub fn stats(&self) -> ContextStats {
        let align_unit = self.policy.align_unit();
        let (defined_textures, live_bytes) = self
            .store
            .iter()
            .filter(|d| d.backing().is_some())
            .fold((0, 0), |(count, bytes), d| {
                (count + 1, bytes + d.byte_size(align_unit).unwrap_or(0))
            });
        ContextStats {
            frame: self.frames.current(),
            live_textures: self.store.len(),
            defined_textures,
            live_bytes,
            reclaims: self.reclaims,
        }
    }

    /// Create a texture slot with no backing store.
    pub fn gen_texture(&mut self) -> SlotId {
        self.store.insert()
    }

    pub fn active_texture(&mut self, unit: usize) -> Result<(), TextureError> {
        self.units.set_active(unit)
    }

    /// Bind `slot` to the active unit.
    pub fn bind_texture(&mut self, slot: SlotId) -> Result<(), TextureError> {
        if !self.store.contains(slot) {
            return Err(TextureError::UnknownSlot { slot });
        }
        self.units.bind(Some(slot));
        Ok(())
    }

    pub fn unbind_texture(&mut self) {
        self.units.bind(None);
    }

    /// Define the bound texture as a 16-bit RGBA5551 surface.
    ///
    /// Fast path: no mipmaps, no border, no pixel upload.
    pub fn define_texture(&mut self, width: u32, height: u32) -> Result<GpuPtr, TextureError> {
        self.define_texture_with_format(TextureFormat::RGBA5551, width, height)
    }

    /// Give the bound texture a fresh backing store of the given layout,
    /// releasing any store it had before.
    pub fn define_texture_with_format(
        &mut self,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<GpuPtr, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }
        let size = self.policy.surface_size(format, width, height)?;
        let slot = self.units.bound()?;
        let desc = self.store.get_mut(slot)?;

        let ptr = match self.allocator.allocate(size, self.policy.memory_class()) {
            Ok(ptr) => ptr,
            Err(err) => {
                tracing::warn!(%slot, size, error = %err, "texture definition failed");
                self.counters.add(keys::ALLOC_FAILURES, 1);
                return Err(err.into());
            }
        };
        if let Some(previous) = desc.backing {
            if let Err(err) = self.allocator.free(previous) {
                let _ = self.allocator.free(ptr);
                return Err(err.into());
            }
        }

        desc.handle.configure(format, width, height);
        desc.handle.set_data(Some(ptr));
        desc.backing = Some(ptr);
        desc.last_use = LastUse::NotUsed;

        self.counters.add(keys::DEFINITIONS, 1);
        tracing::debug!(%slot, ?format, width, height, size, %ptr, "defined texture");
        Ok(ptr)
    }

    /// Pointer to the bound texture's pixels, re-acquiring the backing
    /// store first if the GPU sampled it within the purge window.
    pub fn resolve_backing_pointer(&mut self) -> Result<GpuPtr, TextureError> {
        let slot = self.units.bound()?;
        let desc = self.store.get_mut(slot)?;
        let frame = self.frames.current();

        let resolution = match self.policy.resolve(desc, &mut self.allocator, frame) {
            Ok(resolution) => resolution,
            Err(err) => {
                if matches!(err, TextureError::Alloc(_)) {
                    tracing::warn!(%slot, frame, error = %err, "texture reclamation failed");
                    self.counters.add(keys::ALLOC_FAILURES, 1);
                }
                return Err(err);
            }
        };

        if let Resolution::Reclaimed { size, .. } = resolution {
            self.reclaims += 1;
            self.reclaimed_this_frame += size as u64;
            self.counters.add(keys::RECLAIMS, 1);
            self.counters.add(keys::RECLAIMED_BYTES, size as u64);
        }
        Ok(resolution.ptr())
    }

    /// Stamp the bound texture as consumed by the GPU this frame.
    pub fn mark_sampled(&mut self) -> Result<(), TextureError> {
        let slot = self.units.bound()?;
        let desc = self.store.get_mut(slot)?;
        desc.last_use = LastUse::Frame(self.frames.current());
        Ok(())
    }

    /// Delete a texture, releasing its backing store and clearing it from
    /// every unit.
    ///
    /// If the backing store cannot be released the texture is left in place.
    pub fn delete_texture(&mut self, slot: SlotId) -> Result<(), TextureError> {
        if let Some(ptr) = self.store.get(slot)?.backing() {
            self.allocator.free(ptr)?;
        }
        self.store.remove(slot)?;
        self.units.unbind_everywhere(slot);
        self.counters.add(keys::DELETIONS, 1);
        tracing::debug!(%slot, "deleted texture");
        Ok(())
    }

    /// Close the current frame. Called once per presented frame by the
    /// driver loop.
    pub fn end_frame(&mut self) -> u64 {
        self.reclaim_window.push(self.reclaimed_this_frame);
        self.reclaimed_this_frame = 0;
        self.frames.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{AllocError, HostGpuAllocator, MemoryClass};
    use crate::config::PoolBudgets;
    use crate::format::{align, surface_size};

    type Ctx = TextureContext<HostGpuAllocator>;

    fn context(purge_threshold: u64) -> Ctx {
        let settings = Settings {
            purge_threshold,
            ..Settings::default()
        };
        TextureContext::new(&settings, HostGpuAllocator::unbounded()).unwrap()
    }

    fn advance_to(ctx: &mut Ctx, frame: u64) {
        while ctx.current_frame() < frame {
            ctx.end_frame();
        }
    }

    #[test]
    fn test_define_fast_path() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();

        let ptr = ctx.define_texture(64, 64).unwrap();
        let desc = ctx.descriptor(slot).unwrap();

        assert_eq!(desc.format(), TextureFormat::RGBA5551);
        assert_eq!(desc.width(), 64);
        assert_eq!(desc.height(), 64);
        assert_eq!(desc.backing(), Some(ptr));
        assert_eq!(desc.handle().data(), Some(ptr));
        assert_eq!(desc.last_use(), LastUse::NotUsed);
        assert_eq!(
            ctx.allocator().size_of(ptr),
            Some(64 * align(64, 8) * TextureFormat::RGBA5551.bytes_per_pixel())
        );
    }

    #[test]
    fn test_repeated_resolve_without_use_is_stable() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let ptr = ctx.define_texture(100, 3).unwrap();

        for _ in 0..10 {
            assert_eq!(ctx.resolve_backing_pointer().unwrap(), ptr);
            ctx.end_frame();
        }
        assert_eq!(ctx.descriptor(slot).unwrap().last_use(), LastUse::NotUsed);
    }

    #[test]
    fn test_sampled_at_100_resolved_at_120() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let original = ctx.define_texture(64, 64).unwrap();

        advance_to(&mut ctx, 100);
        ctx.mark_sampled().unwrap();
        assert_eq!(ctx.descriptor(slot).unwrap().last_use(), LastUse::Frame(100));

        advance_to(&mut ctx, 120);
        let fresh = ctx.resolve_backing_pointer().unwrap();
        assert_ne!(fresh, original);
        assert_eq!(ctx.descriptor(slot).unwrap().last_use(), LastUse::NotUsed);
        assert!(!ctx.allocator().contains(original));

        // Same frame, stamp already cleared
        assert_eq!(ctx.resolve_backing_pointer().unwrap(), fresh);
        assert_eq!(ctx.allocator().live_allocations(), 1);
    }

    #[test]
    fn test_resolve_outside_window_keeps_pointer() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let original = ctx.define_texture(32, 32).unwrap();

        advance_to(&mut ctx, 10);
        ctx.mark_sampled().unwrap();
        advance_to(&mut ctx, 41);

        assert_eq!(ctx.resolve_backing_pointer().unwrap(), original);
        assert_eq!(ctx.descriptor(slot).unwrap().last_use(), LastUse::Frame(10));
    }

    #[test]
    fn test_resolve_follows_active_unit() {
        let mut ctx = context(30);
        let a = ctx.gen_texture();
        let b = ctx.gen_texture();

        ctx.bind_texture(a).unwrap();
        let ptr_a = ctx.define_texture(8, 8).unwrap();
        ctx.active_texture(3).unwrap();
        ctx.bind_texture(b).unwrap();
        let ptr_b = ctx.define_texture(8, 8).unwrap();
        ctx.mark_sampled().unwrap();

        ctx.active_texture(0).unwrap();
        assert_eq!(ctx.resolve_backing_pointer().unwrap(), ptr_a);
        ctx.active_texture(3).unwrap();
        assert_ne!(ctx.resolve_backing_pointer().unwrap(), ptr_b);
    }

    #[test]
    fn test_redefine_releases_previous_store() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let first = ctx.define_texture(16, 16).unwrap();
        let second = ctx
            .define_texture_with_format(TextureFormat::U8U8U8U8Abgr, 30, 2)
            .unwrap();

        assert!(!ctx.allocator().contains(first));
        assert_eq!(
            ctx.allocator().size_of(second),
            surface_size(30, 2, TextureFormat::U8U8U8U8Abgr, 8)
        );
        assert_eq!(ctx.allocator().live_allocations(), 1);
        assert_eq!(ctx.stats().defined_textures, 1);
        assert_eq!(ctx.stats().live_bytes, ctx.allocator().live_bytes());
    }

    #[test]
    fn test_failed_release_on_redefine_keeps_texture() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let first = ctx.define_texture(16, 16).unwrap();
        ctx.allocator_mut().free(first).unwrap();

        let err = ctx.define_texture(32, 32).unwrap_err();
        assert_eq!(
            err,
            TextureError::Alloc(AllocError::UnknownPointer { addr: first.addr() })
        );

        let desc = ctx.descriptor(slot).unwrap();
        assert_eq!(desc.backing(), Some(first));
        assert_eq!(desc.handle().data(), Some(first));
        assert_eq!((desc.width(), desc.height()), (16, 16));
        assert_eq!(ctx.allocator().live_allocations(), 0);
    }

    #[test]
    fn test_failed_release_on_delete_keeps_texture() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let ptr = ctx.define_texture(16, 16).unwrap();
        ctx.allocator_mut().free(ptr).unwrap();

        assert_eq!(
            ctx.delete_texture(slot),
            Err(TextureError::Alloc(AllocError::UnknownPointer { addr: ptr.addr() }))
        );
        assert!(ctx.descriptor(slot).is_ok());
        assert_eq!(ctx.bound_slot(), Ok(slot));
        assert_eq!(ctx.stats().live_textures, 1);
    }

    #[test]
    fn test_oversized_definition_is_rejected() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();

        assert_eq!(
            ctx.define_texture(u32::MAX, u32::MAX),
            Err(TextureError::InvalidDimensions {
                width: u32::MAX,
                height: u32::MAX,
            })
        );
        assert_eq!(ctx.descriptor(slot).unwrap().backing(), None);
        assert_eq!(ctx.allocator().live_allocations(), 0);
    }

    #[test]
    fn test_stats_report_bytes_and_reclaims() {
        let mut ctx = context(30);
        let a = ctx.gen_texture();
        ctx.bind_texture(a).unwrap();
        ctx.define_texture(8, 8).unwrap();
        ctx.gen_texture();

        ctx.mark_sampled().unwrap();
        ctx.resolve_backing_pointer().unwrap();
        ctx.resolve_backing_pointer().unwrap();

        let stats = ctx.stats();
        assert_eq!(stats.live_textures, 2);
        assert_eq!(stats.defined_textures, 1);
        assert_eq!(stats.live_bytes, 128);
        assert_eq!(stats.reclaims, 1);
    }

    #[test]
    fn test_delete_frees_and_unbinds() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        ctx.define_texture(16, 16).unwrap();

        ctx.delete_texture(slot).unwrap();

        assert_eq!(ctx.allocator().live_bytes(), 0);
        assert_eq!(
            ctx.resolve_backing_pointer(),
            Err(TextureError::NoTextureBound { unit: 0 })
        );
        assert_eq!(ctx.bind_texture(slot), Err(TextureError::UnknownSlot { slot }));
        assert_eq!(ctx.delete_texture(slot), Err(TextureError::UnknownSlot { slot }));
        assert_eq!(ctx.stats().live_textures, 0);
    }

    #[test]
    fn test_precondition_errors() {
        let mut ctx = context(30);
        assert_eq!(
            ctx.define_texture(4, 4),
            Err(TextureError::NoTextureBound { unit: 0 })
        );
        assert_eq!(
            ctx.active_texture(16),
            Err(TextureError::UnitOutOfRange { unit: 16, count: 16 })
        );

        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        assert_eq!(
            ctx.resolve_backing_pointer(),
            Err(TextureError::Undefined { slot })
        );
        assert_eq!(
            ctx.define_texture(0, 4),
            Err(TextureError::InvalidDimensions { width: 0, height: 4 })
        );
    }

    #[test]
    fn test_failed_definition_keeps_old_store() {
        let settings = Settings {
            memory_class: MemoryClass::Vram,
            pools: PoolBudgets {
                vram: 600,
                ram: 0,
                slow: 0,
                budget: 0,
                external: 0,
            },
            ..Settings::default()
        };
        let mut ctx: Ctx =
            TextureContext::new(&settings, HostGpuAllocator::new(&settings.pools)).unwrap();
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        let ptr = ctx.define_texture(16, 16).unwrap();

        let err = ctx.define_texture(16, 16).unwrap_err();
        assert!(matches!(
            err,
            TextureError::Alloc(AllocError::OutOfMemory { requested: 512, .. })
        ));
        assert_eq!(ctx.descriptor(slot).unwrap().backing(), Some(ptr));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = Settings {
            align_unit: 3,
            ..Settings::default()
        };
        let result: Result<Ctx, _> = TextureContext::new(&settings, HostGpuAllocator::unbounded());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAlignUnit { align_unit: 3 })
        ));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_reclaims_are_counted() {
        let mut ctx = context(30);
        let slot = ctx.gen_texture();
        ctx.bind_texture(slot).unwrap();
        ctx.define_texture(8, 8).unwrap();

        ctx.mark_sampled().unwrap();
        ctx.resolve_backing_pointer().unwrap();
        ctx.end_frame();

        assert_eq!(ctx.counters().get(keys::RECLAIMS), 1);
        assert_eq!(ctx.counters().get(keys::RECLAIMED_BYTES), 128);
        assert_eq!(ctx.counters().get(keys::DEFINITIONS), 1);
        assert_eq!(ctx.reclaim_window().peak(), 128);
    }
}
