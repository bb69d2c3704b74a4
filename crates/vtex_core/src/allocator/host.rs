//! Host-backed GPU allocator
//!
//! Stands in for the SDK allocator on machines without the real device:
//! every allocation gets a fresh virtual address (addresses are never
//! reused) and a zeroed host buffer so callers can stream pixels into it.

use super::{AllocError, GpuAllocator, GpuPtr, MemoryClass};
use crate::config::PoolBudgets;
use crate::format::align;
use std::collections::HashMap;

const BASE_ADDR: usize = 0x8100_0000;
const ADDR_ALIGN: usize = 256;

struct Block {
    class: MemoryClass,
    bytes: Box<[u8]>,
}

pub struct HostGpuAllocator {
    capacity: HashMap<MemoryClass, usize>,
    used: HashMap<MemoryClass, usize>,
    blocks: HashMap<GpuPtr, Block>,
    next_addr: usize,
}

impl HostGpuAllocator {
    pub fn new(budgets: &PoolBudgets) -> Self {
        let capacity = budgets.iter().collect();
        Self {
            capacity,
            used: HashMap::new(),
            blocks: HashMap::new(),
            next_addr: BASE_ADDR,
        }
    }

    /// Allocator where every pool is effectively unlimited.
    pub fn unbounded() -> Self {
        Self::new(&PoolBudgets::uniform(usize::MAX))
    }

    pub fn used(&self, class: MemoryClass) -> usize {
        self.used.get(&class).copied().unwrap_or(0)
    }

    pub fn available(&self, class: MemoryClass) -> usize {
        let capacity = self.capacity.get(&class).copied().unwrap_or(0);
        capacity.saturating_sub(self.used(class))
    }

    pub fn live_allocations(&self) -> usize {
        self.blocks.len()
    }

    pub fn live_bytes(&self) -> usize {
        self.blocks.values().map(|b| b.bytes.len()).sum()
    }

    pub fn contains(&self, ptr: GpuPtr) -> bool {
        self.blocks.contains_key(&ptr)
    }

    pub fn size_of(&self, ptr: GpuPtr) -> Option<usize> {
        self.blocks.get(&ptr).map(|b| b.bytes.len())
    }

    /// Pool an allocation was actually served from.
    pub fn class_of(&self, ptr: GpuPtr) -> Option<MemoryClass> {
        self.blocks.get(&ptr).map(|b| b.class)
    }

    pub fn backing_bytes(&self, ptr: GpuPtr) -> Option<&[u8]> {
        self.blocks.get(&ptr).map(|b| &b.bytes[..])
    }

    pub fn backing_bytes_mut(&mut self, ptr: GpuPtr) -> Option<&mut [u8]> {
        self.blocks.get_mut(&ptr).map(|b| &mut b.bytes[..])
    }

    fn reserve_addr(&mut self, size: usize, class: MemoryClass) -> Result<GpuPtr, AllocError> {
        let exhausted = AllocError::OutOfMemory {
            class,
            requested: size,
            available: 0,
        };
        let span = size
            .checked_add(ADDR_ALIGN - 1)
            .map(|s| s & !(ADDR_ALIGN - 1))
            .ok_or_else(|| exhausted.clone())?;
        let addr = self.next_addr;
        self.next_addr = addr.checked_add(span).ok_or_else(|| exhausted.clone())?;
        GpuPtr::new(addr).ok_or(exhausted)
    }
}

impl Default for HostGpuAllocator {
    fn default() -> Self {
        Self::new(&PoolBudgets::default())
    }
}

impl GpuAllocator for HostGpuAllocator {
    fn allocate(&mut self, size: usize, class: MemoryClass) -> Result<GpuPtr, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }

        let Some(&pool) = class
            .candidates()
            .iter()
            .find(|&&pool| self.available(pool) >= size)
        else {
            let available = class
                .candidates()
                .iter()
                .map(|&pool| self.available(pool))
                .max()
                .unwrap_or(0);
            return Err(AllocError::OutOfMemory {
                class,
                requested: size,
                available,
            });
        };

        let ptr = self.reserve_addr(size, class)?;
        *self.used.entry(pool).or_insert(0) += size;
        self.blocks.insert(
            ptr,
            Block {
                class: pool,
                bytes: vec![0u8; size].into_boxed_slice(),
            },
        );
        debug_assert_eq!(ptr.addr(), align(ptr.addr(), ADDR_ALIGN));
        Ok(ptr)
    }

    fn free(&mut self, ptr: GpuPtr) -> Result<(), AllocError> {
        let block = self
            .blocks
            .remove(&ptr)
            .ok_or(AllocError::UnknownPointer { addr: ptr.addr() })?;
        if let Some(used) = self.used.get_mut(&block.class) {
            *used -= block.bytes.len();
        }
        Ok(())
    }
}
