//! Texture memory reclamation policy
//!
//! Handing out the backing pointer of a texture the GPU sampled within the
//! last `purge_threshold` frames would let the CPU write into memory a
//! queued draw may still read. Such accesses get a fresh allocation
//! instead, and the texture's use stamp is cleared so repeated accesses in
//! the same frame keep the new pointer.

use crate::allocator::{GpuAllocator, GpuPtr, MemoryClass};
use crate::config::Settings;
use crate::error::TextureError;
use crate::format::{self, TextureFormat};
use crate::frame::LastUse;
use crate::handle::SdkTexture;
use crate::store::TextureDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclamationPolicy {
    purge_threshold: u64,
    align_unit: usize,
    memory_class: MemoryClass,
}

/// Outcome of resolving a texture's backing pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The existing allocation was handed back untouched.
    Reused(GpuPtr),
    /// A new allocation of `size` bytes replaced `previous`.
    Reclaimed {
        ptr: GpuPtr,
        previous: GpuPtr,
        size: usize,
    },
}

impl Resolution {
    pub fn ptr(self) -> GpuPtr {
        match self {
            Resolution::Reused(ptr) => ptr,
            Resolution::Reclaimed { ptr, .. } => ptr,
        }
    }

    pub fn reclaimed(self) -> bool {
        matches!(self, Resolution::Reclaimed { .. })
    }
}

impl ReclamationPolicy {
    pub fn new(purge_threshold: u64, align_unit: usize, memory_class: MemoryClass) -> Self {
        debug_assert!(align_unit.is_power_of_two());
        Self {
            purge_threshold,
            align_unit,
            memory_class,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.purge_threshold,
            settings.align_unit,
            settings.memory_class,
        )
    }

    pub fn purge_threshold(&self) -> u64 {
        self.purge_threshold
    }

    pub fn align_unit(&self) -> usize {
        self.align_unit
    }

    pub fn memory_class(&self) -> MemoryClass {
        self.memory_class
    }

    /// True when a texture last used at `last_use` must be re-acquired at
    /// `current_frame`.
    pub fn should_reclaim(&self, last_use: LastUse, current_frame: u64) -> bool {
        last_use
            .frames_since(current_frame)
            .is_some_and(|elapsed| elapsed <= self.purge_threshold)
    }

    /// Backing store size for a surface, rejecting layouts whose size does
    /// not fit in `usize`.
    pub fn surface_size(
        &self,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<usize, TextureError> {
        format::surface_size(width, height, format, self.align_unit)
            .ok_or(TextureError::InvalidDimensions { width, height })
    }

    /// Return a pointer to `desc`'s backing store, swapping in a fresh
    /// allocation if the current one was sampled recently.
    ///
    /// The replacement is allocated before the old store is released, and
    /// `desc` is only modified once both steps succeeded.
    pub fn resolve<H, A>(
        &self,
        desc: &mut TextureDescriptor<H>,
        allocator: &mut A,
        current_frame: u64,
    ) -> Result<Resolution, TextureError>
    where
        H: SdkTexture,
        A: GpuAllocator,
    {
        let current = desc
            .backing
            .ok_or(TextureError::Undefined { slot: desc.slot() })?;

        if !self.should_reclaim(desc.last_use, current_frame) {
            tracing::trace!(slot = %desc.slot(), ptr = %current, "reusing texture memory");
            return Ok(Resolution::Reused(current));
        }

        let size = self.surface_size(desc.format(), desc.width(), desc.height())?;
        let fresh = allocator.allocate(size, self.memory_class)?;
        if let Err(err) = allocator.free(current) {
            // Old store is not ours to free; don't leak the new one too.
            let _ = allocator.free(fresh);
            return Err(err.into());
        }

        desc.handle.set_data(Some(fresh));
        desc.backing = Some(fresh);
        desc.last_use = LastUse::NotUsed;

        tracing::debug!(
            slot = %desc.slot(),
            previous = %current,
            ptr = %fresh,
            size,
            frame = current_frame,
            "reclaimed texture memory"
        );
        Ok(Resolution::Reclaimed {
            ptr: fresh,
            previous: current,
            size,
        })
    }
}

impl Default for ReclamationPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
