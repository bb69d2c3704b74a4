use crate::allocator::AllocError;
use crate::store::SlotId;
use thiserror::Error;

/// Errors raised by texture operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture unit {unit} out of range (have {count})")]
    UnitOutOfRange { unit: usize, count: usize },

    #[error("no texture bound to unit {unit}")]
    NoTextureBound { unit: usize },

    #[error("texture slot {slot} does not exist")]
    UnknownSlot { slot: SlotId },

    #[error("texture slot {slot} has no backing store")]
    Undefined { slot: SlotId },

    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Alloc(#[from] AllocError),
}
