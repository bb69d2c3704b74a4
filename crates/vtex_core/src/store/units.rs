use super::SlotId;
use crate::error::TextureError;

/// Texture unit table: the active unit and the slot bound to each unit's
/// 2D binding point.
#[derive(Debug, Clone)]
pub struct TextureUnits {
    active: usize,
    bound: Vec<Option<SlotId>>,
}

impl TextureUnits {
    pub fn new(count: usize) -> Self {
        Self {
            active: 0,
            bound: vec![None; count],
        }
    }

    pub fn count(&self) -> usize {
        self.bound.len()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, unit: usize) -> Result<(), TextureError> {
        if unit >= self.bound.len() {
            return Err(TextureError::UnitOutOfRange {
                unit,
                count: self.bound.len(),
            });
        }
        self.active = unit;
        Ok(())
    }

    /// Bind `slot` (or nothing) to the active unit.
    pub fn bind(&mut self, slot: Option<SlotId>) {
        self.bound[self.active] = slot;
    }

    /// Slot bound to the active unit.
    pub fn bound(&self) -> Result<SlotId, TextureError> {
        self.bound[self.active].ok_or(TextureError::NoTextureBound { unit: self.active })
    }

    pub fn bound_at(&self, unit: usize) -> Option<SlotId> {
        self.bound.get(unit).copied().flatten()
    }

    /// Clear `slot` from every unit it is bound to.
    pub fn unbind_everywhere(&mut self, slot: SlotId) {
        for binding in &mut self.bound {
            if *binding == Some(slot) {
                *binding = None;
            }
        }
    }
}
