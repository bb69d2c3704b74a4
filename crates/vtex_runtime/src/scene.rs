//! Streaming texture scene
//!
//! Mirrors how an emulator front end feeds its renderer: a palette strip
//! and a VRAM page are rewritten from the CPU each frame, then sampled by
//! the draw. The palette is drawn every frame, the VRAM page only every
//! `VRAM_DRAW_INTERVAL` frames, so both the reclaim and reuse paths run.

use vtex_core::{GpuPtr, HostGpuAllocator, SlotId, TextureContext, TextureError};

const PALETTE_TEXELS: u32 = 4096;
const VRAM_WIDTH: u32 = 512;
const VRAM_HEIGHT: u32 = 96;
const VRAM_DRAW_INTERVAL: u64 = 45;

type Ctx = TextureContext<HostGpuAllocator>;

pub struct StreamingScene {
    palette: SlotId,
    vram: SlotId,
    texels: Vec<u16>,
}

impl StreamingScene {
    pub fn new(ctx: &mut Ctx) -> Result<Self, TextureError> {
        let palette = ctx.gen_texture();
        ctx.bind_texture(palette)?;
        ctx.define_texture(PALETTE_TEXELS, 1)?;

        let vram = ctx.gen_texture();
        ctx.active_texture(1)?;
        ctx.bind_texture(vram)?;
        ctx.define_texture(VRAM_WIDTH, VRAM_HEIGHT)?;
        ctx.active_texture(0)?;

        Ok(Self {
            palette,
            vram,
            texels: Vec::new(),
        })
    }

    /// Upload, draw and present one frame.
    pub fn frame(&mut self, ctx: &mut Ctx) -> Result<(), TextureError> {
        let frame = ctx.current_frame();

        ctx.active_texture(0)?;
        self.upload(ctx, frame)?;
        ctx.mark_sampled()?;

        ctx.active_texture(1)?;
        self.upload(ctx, frame)?;
        if frame % VRAM_DRAW_INTERVAL == 0 {
            ctx.mark_sampled()?;
        }

        ctx.active_texture(0)?;
        ctx.end_frame();
        Ok(())
    }

    /// Write a frame-dependent RGBA5551 gradient into the bound texture.
    fn upload(&mut self, ctx: &mut Ctx, frame: u64) -> Result<GpuPtr, TextureError> {
        let ptr = ctx.resolve_backing_pointer()?;
        let slot = ctx.bound_slot()?;
        let desc = ctx.descriptor(slot)?;
        let (width, height) = (desc.width() as usize, desc.height() as usize);
        let stride = desc
            .stride(ctx.policy().align_unit())
            .ok_or(TextureError::InvalidDimensions {
                width: desc.width(),
                height: desc.height(),
            })?;

        self.texels.clear();
        self.texels
            .extend((0..width).map(|x| 0x8000 | ((x as u64 + frame) & 0x7fff) as u16));
        let row: &[u8] = bytemuck::cast_slice(&self.texels);

        let bytes = ctx
            .allocator_mut()
            .backing_bytes_mut(ptr)
            .ok_or(TextureError::Undefined { slot })?;
        for y in 0..height {
            let start = y * stride;
            bytes[start..start + row.len()].copy_from_slice(row);
        }
        Ok(ptr)
    }

    pub fn teardown(self, ctx: &mut Ctx) -> Result<(), TextureError> {
        ctx.delete_texture(self.palette)?;
        ctx.delete_texture(self.vram)?;
        Ok(())
    }
}
