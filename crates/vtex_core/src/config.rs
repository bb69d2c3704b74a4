//! Settings management

use crate::allocator::MemoryClass;
use crate::format::DEFAULT_ALIGN_UNIT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const MIB: usize = 1024 * 1024;

/// Texture memory settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frames during which a sampled texture counts as recently used.
    pub purge_threshold: u64,
    /// Row alignment in pixels. Must be a power of two.
    pub align_unit: usize,
    /// Pool used when (re)allocating texture backing stores.
    pub memory_class: MemoryClass,
    pub texture_units: usize,
    pub pools: PoolBudgets,
    /// Frames kept in the reclaimed-bytes window.
    pub metrics_window: usize,
}

/// Byte capacity of each memory pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolBudgets {
    pub vram: usize,
    pub ram: usize,
    pub slow: usize,
    pub budget: usize,
    pub external: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("align_unit must be a non-zero power of two, got {align_unit}")]
    InvalidAlignUnit { align_unit: usize },

    #[error("at least one texture unit is required")]
    NoTextureUnits,

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.align_unit.is_power_of_two() {
            return Err(ConfigError::InvalidAlignUnit {
                align_unit: self.align_unit,
            });
        }
        if self.texture_units == 0 {
            return Err(ConfigError::NoTextureUnits);
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            purge_threshold: 30,
            align_unit: DEFAULT_ALIGN_UNIT,
            memory_class: MemoryClass::Main,
            texture_units: 16,
            pools: PoolBudgets::default(),
            metrics_window: 60,
        }
    }
}

impl PoolBudgets {
    /// Same capacity for every pool.
    pub fn uniform(bytes: usize) -> Self {
        Self {
            vram: bytes,
            ram: bytes,
            slow: bytes,
            budget: bytes,
            external: bytes,
        }
    }

    /// `(pool, capacity)` pairs for every concrete pool.
    pub fn iter(&self) -> impl Iterator<Item = (MemoryClass, usize)> {
        [
            (MemoryClass::Vram, self.vram),
            (MemoryClass::Ram, self.ram),
            (MemoryClass::Slow, self.slow),
            (MemoryClass::Budget, self.budget),
            (MemoryClass::External, self.external),
        ]
        .into_iter()
    }
}

impl Default for PoolBudgets {
    fn default() -> Self {
        Self {
            vram: 112 * MIB,
            ram: 256 * MIB,
            slow: 64 * MIB,
            budget: 32 * MIB,
            external: 0,
        }
    }
}
