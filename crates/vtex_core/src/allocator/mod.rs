//! GPU memory allocation
//!
//! The SDK's allocator is consumed through [`GpuAllocator`]. Pointers are
//! opaque addresses in GPU-mapped space; the caller never dereferences them
//! directly.

mod host;

pub use host::HostGpuAllocator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use thiserror::Error;

/// Address of a live GPU-mapped allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuPtr(NonZeroUsize);

impl GpuPtr {
    pub const fn new(addr: usize) -> Option<Self> {
        match NonZeroUsize::new(addr) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    pub const fn addr(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for GpuPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.addr())
    }
}

/// Memory pools exposed by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryClass {
    /// Dedicated video memory
    Vram,
    /// Uncached main memory mapped for the GPU
    Ram,
    /// Physically contiguous slow memory
    Slow,
    /// Memory borrowed from the application budget
    Budget,
    /// Externally provided memory
    External,
    /// VRAM first, then main RAM
    Main,
}

impl MemoryClass {
    /// Pools tried, in order, when allocating from this class.
    pub const fn candidates(self) -> &'static [MemoryClass] {
        match self {
            MemoryClass::Vram => &[MemoryClass::Vram],
            MemoryClass::Ram => &[MemoryClass::Ram],
            MemoryClass::Slow => &[MemoryClass::Slow],
            MemoryClass::Budget => &[MemoryClass::Budget],
            MemoryClass::External => &[MemoryClass::External],
            MemoryClass::Main => &[MemoryClass::Vram, MemoryClass::Ram],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("out of {class:?} memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        class: MemoryClass,
        requested: usize,
        available: usize,
    },

    #[error("pointer {addr:#010x} does not refer to a live allocation")]
    UnknownPointer { addr: usize },

    #[error("zero-sized allocation requested")]
    ZeroSize,
}

/// Allocator for GPU-mapped memory regions.
pub trait GpuAllocator {
    /// Allocate `size` bytes from `class`.
    fn allocate(&mut self, size: usize, class: MemoryClass) -> Result<GpuPtr, AllocError>;

    /// Release an allocation previously returned by [`GpuAllocator::allocate`].
    fn free(&mut self, ptr: GpuPtr) -> Result<(), AllocError>;
}
