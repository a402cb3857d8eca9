//! 26.6 fixed-point metric conversion
//!
//! Outline metrics arrive in 26.6 units (64 per pixel). The pixel box
//! computed here decides every packing position downstream, so the
//! rounding must stay bit-exact.

/// Round down to a whole pixel (still 26.6)
#[inline]
pub fn floor64(x: i64) -> i64 {
    x & -64
}

/// Round up to a whole pixel (still 26.6)
#[inline]
pub fn ceil64(x: i64) -> i64 {
    (x + 63) & -64
}

/// 26.6 to whole pixels, arithmetic shift
#[inline]
pub fn trunc64(x: i64) -> i64 {
    x >> 6
}

/// Horizontal outline metrics of one glyph, 26.6 units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineMetrics {
    pub width: i64,
    pub height: i64,
    pub bearing_x: i64,
    pub bearing_y: i64,
    pub advance: i64,
}

/// Row layout of a coverage bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelMode {
    /// One byte of coverage per pixel, rows padded to 4 bytes
    #[default]
    Gray,
    /// One bit per pixel, rows padded to whole bytes
    Mono,
}

/// Pixel-space box of a glyph
///
/// `left`, `right`, `top` and `bottom` stay in 26.6 (pixel aligned);
/// `width`, `height` and `pitch` are whole pixels / bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphBox {
    pub left: i64,
    pub right: i64,
    pub width: i32,
    pub top: i64,
    pub bottom: i64,
    pub height: i32,
    pub pitch: i32,
    pub mode: PixelMode,
}

impl GlyphBox {
    pub fn from_metrics(m: &OutlineMetrics, mode: PixelMode) -> Self {
        let left = floor64(m.bearing_x);
        let right = ceil64(m.bearing_x + m.width);
        let width = trunc64(right - left) as i32;

        let top = ceil64(m.bearing_y);
        let bottom = floor64(m.bearing_y - m.height);
        let height = trunc64(top - bottom) as i32;

        Self {
            left,
            right,
            width,
            top,
            bottom,
            height,
            pitch: pitch_for(width, mode),
            mode,
        }
    }

    /// Bytes needed for the bitmap
    pub fn byte_len(&self) -> usize {
        (self.pitch.max(0) as usize) * (self.height.max(0) as usize)
    }
}

/// Bytes per row for a bitmap of `width` pixels
#[inline]
pub fn pitch_for(width: i32, mode: PixelMode) -> i32 {
    match mode {
        PixelMode::Gray => (width + 3) & -4,
        PixelMode::Mono => (width + 7) >> 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(floor64(0), 0);
        assert_eq!(floor64(63), 0);
        assert_eq!(floor64(64), 64);
        assert_eq!(floor64(-1), -64);
        assert_eq!(ceil64(1), 64);
        assert_eq!(ceil64(64), 64);
        assert_eq!(ceil64(-63), 0);
        assert_eq!(trunc64(128), 2);
        assert_eq!(trunc64(-64), -1);
    }

    #[test]
    fn test_box_from_metrics() {
        let m = OutlineMetrics {
            width: 7 * 64 + 10,
            height: 9 * 64,
            bearing_x: 32,
            bearing_y: 7 * 64 + 5,
            advance: 9 * 64,
        };
        let b = GlyphBox::from_metrics(&m, PixelMode::Gray);
        assert_eq!(b.left, 0);
        assert_eq!(b.right, 8 * 64);
        assert_eq!(b.width, 8);
        assert_eq!(b.top, 8 * 64);
        assert_eq!(b.bottom, -2 * 64);
        assert_eq!(b.height, 10);
        assert_eq!(b.pitch, 8);
        assert_eq!(b.byte_len(), 80);
    }

    #[test]
    fn test_pitch_alignment() {
        assert_eq!(pitch_for(0, PixelMode::Gray), 0);
        assert_eq!(pitch_for(1, PixelMode::Gray), 4);
        assert_eq!(pitch_for(5, PixelMode::Gray), 8);
        assert_eq!(pitch_for(8, PixelMode::Gray), 8);
        assert_eq!(pitch_for(1, PixelMode::Mono), 1);
        assert_eq!(pitch_for(9, PixelMode::Mono), 2);
    }

    #[test]
    fn test_width_monotonic_in_extent() {
        for bx in [-130i64, -64, -1, 0, 1, 31, 63, 64, 200] {
            let mut prev = i64::MIN;
            for w in 0..(20 * 64) {
                let px = trunc64(ceil64(bx + w) - floor64(bx));
                assert!(px >= prev, "width shrank at bx={} w={}", bx, w);
                prev = px;
            }
        }
    }
}
