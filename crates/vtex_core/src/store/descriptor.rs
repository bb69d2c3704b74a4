use super::SlotId;
use crate::allocator::GpuPtr;
use crate::error::TextureError;
use crate::format::{self, TextureFormat};
use crate::frame::LastUse;
use crate::handle::SdkTexture;

/// One GPU texture slot.
///
/// Layout (format, width, height) is read from the SDK handle rather than
/// cached here. When `backing` is set, the allocation holds exactly
/// `align(width, align_unit) * bpp * height` bytes.
#[derive(Debug)]
pub struct TextureDescriptor<H> {
    slot: SlotId,
    pub(crate) handle: H,
    pub(crate) backing: Option<GpuPtr>,
    pub(crate) last_use: LastUse,
}

impl<H: SdkTexture> TextureDescriptor<H> {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn format(&self) -> TextureFormat {
        self.handle.format()
    }

    pub fn width(&self) -> u32 {
        self.handle.width()
    }

    pub fn height(&self) -> u32 {
        self.handle.height()
    }

    pub fn backing(&self) -> Option<GpuPtr> {
        self.backing
    }

    pub fn last_use(&self) -> LastUse {
        self.last_use
    }

    pub fn stride(&self, align_unit: usize) -> Option<usize> {
        format::stride(self.width(), self.format(), align_unit)
    }

    pub fn byte_size(&self, align_unit: usize) -> Option<usize> {
        format::surface_size(self.width(), self.height(), self.format(), align_unit)
    }
}

struct Entry<H> {
    generation: u32,
    descriptor: Option<TextureDescriptor<H>>,
}

/// Arena of texture descriptors.
pub struct TextureStore<H> {
    entries: Vec<Entry<H>>,
    free: Vec<u32>,
    live: usize,
}

impl<H> TextureStore<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.get(slot).is_ok()
    }

    pub fn get(&self, slot: SlotId) -> Result<&TextureDescriptor<H>, TextureError> {
        self.entries
            .get(slot.index() as usize)
            .filter(|e| e.generation == slot.generation())
            .and_then(|e| e.descriptor.as_ref())
            .ok_or(TextureError::UnknownSlot { slot })
    }

    pub fn get_mut(&mut self, slot: SlotId) -> Result<&mut TextureDescriptor<H>, TextureError> {
        self.entries
            .get_mut(slot.index() as usize)
            .filter(|e| e.generation == slot.generation())
            .and_then(|e| e.descriptor.as_mut())
            .ok_or(TextureError::UnknownSlot { slot })
    }

    /// Remove a descriptor, invalidating `slot`. The caller owns whatever
    /// backing store the descriptor still holds.
    pub fn remove(&mut self, slot: SlotId) -> Result<TextureDescriptor<H>, TextureError> {
        let entry = self
            .entries
            .get_mut(slot.index() as usize)
            .filter(|e| e.generation == slot.generation())
            .ok_or(TextureError::UnknownSlot { slot })?;
        let descriptor = entry
            .descriptor
            .take()
            .ok_or(TextureError::UnknownSlot { slot })?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot.index());
        self.live -= 1;
        Ok(descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureDescriptor<H>> {
        self.entries.iter().filter_map(|e| e.descriptor.as_ref())
    }
}

impl<H: Default> TextureStore<H> {
    /// Create an empty descriptor with a fresh SDK handle.
    pub fn insert(&mut self) -> SlotId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    descriptor: None,
                });
                (self.entries.len() - 1) as u32
            }
        };
        let entry = &mut self.entries[index as usize];
        let slot = SlotId::new(index, entry.generation);
        entry.descriptor = Some(TextureDescriptor {
            slot,
            handle: H::default(),
            backing: None,
            last_use: LastUse::NotUsed,
        });
        self.live += 1;
        slot
    }
}

impl<H> Default for TextureStore<H> {
    fn default() -> Self {
        Self::new()
    }
}
