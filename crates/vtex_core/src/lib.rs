//! vtex Core
//!
//! Texture memory management for a GL-style shim sitting on a low-level
//! GPU SDK:
//! - Pixel formats and surface sizing
//! - GPU allocator and SDK texture capabilities
//! - Descriptor arena and texture unit bindings
//! - Frame-counted reclamation of texture backing memory

pub mod allocator;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod frame;
pub mod handle;
pub mod policy;
pub mod store;

pub use allocator::{AllocError, GpuAllocator, GpuPtr, HostGpuAllocator, MemoryClass};
pub use config::{ConfigError, PoolBudgets, Settings};
pub use context::{ContextStats, TextureContext};
pub use error::TextureError;
pub use format::TextureFormat;
pub use frame::{FrameCounter, LastUse};
pub use handle::{SdkTexture, SoftTexture};
pub use policy::{ReclamationPolicy, Resolution};
pub use store::{SlotId, TextureDescriptor, TextureStore, TextureUnits};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
