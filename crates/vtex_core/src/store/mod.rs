//! Texture descriptor arena and unit bindings.
//!
//! Descriptors live in an owned arena addressed by generational
//! [`SlotId`]s; the unit table maps each texture unit to the slot bound at
//! its 2D binding point. Both are owned by the texture context rather than
//! living in global tables.

mod descriptor;
mod slot;
mod units;

pub use descriptor::{TextureDescriptor, TextureStore};
pub use slot::SlotId;
pub use units::TextureUnits;
