//! Texture slot handle with generational index

use std::fmt;

/// Texture slot handle (generation-indexed for safety)
///
/// Deleting a texture bumps the generation of its slot, so handles kept
/// around after deletion are rejected instead of aliasing whatever texture
/// reuses the slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
