//! Pixel formats and surface size arithmetic
//!
//! Rows are padded to a whole number of `align_unit` pixels, so the byte
//! stride of a surface is `align(width, align_unit) * bytes_per_pixel`.

use serde::{Deserialize, Serialize};

/// Row alignment used by the SDK, in pixels.
pub const DEFAULT_ALIGN_UNIT: usize = 8;

/// Texture formats understood by the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit luminance
    U8,
    /// 8-bit palette index
    P8,
    /// 8-bit luminance + alpha
    U8U8,
    /// 16-bit packed BGR565
    U5U6U5Bgr,
    /// 16-bit packed ABGR1555
    U1U5U5U5Abgr,
    /// 16-bit packed ABGR4444
    U4U4U4U4Abgr,
    /// 24-bit BGR
    U8U8U8Bgr,
    /// 32-bit ABGR
    U8U8U8U8Abgr,
}

impl TextureFormat {
    /// Format used by the 16-bit definition fast path.
    pub const RGBA5551: TextureFormat = TextureFormat::U1U5U5U5Abgr;

    pub const ALL: [TextureFormat; 8] = [
        TextureFormat::U8,
        TextureFormat::P8,
        TextureFormat::U8U8,
        TextureFormat::U5U6U5Bgr,
        TextureFormat::U1U5U5U5Abgr,
        TextureFormat::U4U4U4U4Abgr,
        TextureFormat::U8U8U8Bgr,
        TextureFormat::U8U8U8U8Abgr,
    ];

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::U8 | TextureFormat::P8 => 1,
            TextureFormat::U8U8
            | TextureFormat::U5U6U5Bgr
            | TextureFormat::U1U5U5U5Abgr
            | TextureFormat::U4U4U4U4Abgr => 2,
            TextureFormat::U8U8U8Bgr => 3,
            TextureFormat::U8U8U8U8Abgr => 4,
        }
    }
}

/// Round `value` up to a multiple of `unit` (a power of two).
#[inline]
pub const fn align(value: usize, unit: usize) -> usize {
    debug_assert!(unit.is_power_of_two());
    (value + unit - 1) & !(unit - 1)
}

/// [`align`], or `None` if rounding up overflows.
#[inline]
pub const fn checked_align(value: usize, unit: usize) -> Option<usize> {
    debug_assert!(unit.is_power_of_two());
    match value.checked_add(unit - 1) {
        Some(padded) => Some(padded & !(unit - 1)),
        None => None,
    }
}

/// Bytes per row, including alignment padding. `None` on overflow.
#[inline]
pub const fn stride(width: u32, format: TextureFormat, align_unit: usize) -> Option<usize> {
    match checked_align(width as usize, align_unit) {
        Some(padded) => padded.checked_mul(format.bytes_per_pixel()),
        None => None,
    }
}

/// Bytes needed to back a `width` x `height` surface. `None` on overflow.
#[inline]
pub const fn surface_size(
    width: u32,
    height: u32,
    format: TextureFormat,
    align_unit: usize,
) -> Option<usize> {
    match stride(width, format, align_unit) {
        Some(stride) => stride.checked_mul(height as usize),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_rounds_up() {
        assert_eq!(align(0, 8), 0);
        assert_eq!(align(1, 8), 8);
        assert_eq!(align(8, 8), 8);
        assert_eq!(align(9, 8), 16);
        assert_eq!(align(513, 256), 768);
    }

    #[test]
    fn test_stride_law_holds_for_all_formats() {
        for format in TextureFormat::ALL {
            let bpp = format.bytes_per_pixel();
            for width in 1..=300u32 {
                let s = stride(width, format, DEFAULT_ALIGN_UNIT).unwrap();
                assert_eq!(s % bpp, 0, "{format:?} width {width}");
                assert!(s >= width as usize * bpp, "{format:?} width {width}");
                assert!(s < (width as usize + DEFAULT_ALIGN_UNIT) * bpp);
            }
        }
    }

    #[test]
    fn test_surface_size_matches_padded_rows() {
        // 4096x1 palette strip in 16-bit
        assert_eq!(surface_size(4096, 1, TextureFormat::RGBA5551, 8), Some(8192));
        // 30 pixels pad to 32
        assert_eq!(
            surface_size(30, 10, TextureFormat::U8U8U8Bgr, 8),
            Some(32 * 3 * 10)
        );
    }

    #[test]
    fn test_oversized_surfaces_do_not_overflow() {
        assert_eq!(checked_align(usize::MAX, 8), None);
        assert_eq!(checked_align(usize::MAX - 7, 8), Some(usize::MAX - 7));
        assert_eq!(
            surface_size(u32::MAX, u32::MAX, TextureFormat::U8U8U8U8Abgr, 8),
            None
        );
    }
}
