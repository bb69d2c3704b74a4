//! SDK texture capability
//!
//! The texture code only needs to read a handle's layout and point it at new
//! memory, so that is all [`SdkTexture`] exposes. [`SoftTexture`] is the
//! in-process implementation used off-device.

use crate::allocator::GpuPtr;
use crate::format::TextureFormat;

pub trait SdkTexture {
    fn format(&self) -> TextureFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Point the handle at a new backing store.
    fn set_data(&mut self, data: Option<GpuPtr>);

    /// (Re)initialise the handle's layout.
    fn configure(&mut self, format: TextureFormat, width: u32, height: u32);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftTexture {
    format: TextureFormat,
    width: u32,
    height: u32,
    data: Option<GpuPtr>,
}

impl SoftTexture {
    pub fn data(&self) -> Option<GpuPtr> {
        self.data
    }
}

impl Default for SoftTexture {
    fn default() -> Self {
        Self {
            format: TextureFormat::U8U8U8U8Abgr,
            width: 0,
            height: 0,
            data: None,
        }
    }
}

impl SdkTexture for SoftTexture {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_data(&mut self, data: Option<GpuPtr>) {
        self.data = data;
    }

    fn configure(&mut self, format: TextureFormat, width: u32, height: u32) {
        self.format = format;
        self.width = width;
        self.height = height;
    }
}
