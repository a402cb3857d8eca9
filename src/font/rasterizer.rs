//! Rasterizer interface and glyph rasterization
//!
//! The outline rasterizer itself is external (FreeType in production,
//! see [`super::freetype`]). This module turns one code point into a
//! coverage bitmap plus normalized glyph metrics.

use log::{debug, warn};

use super::fixed::{trunc64, GlyphBox, OutlineMetrics, PixelMode};
use super::glyph::GlyphMetrics;
use crate::error::{FontError, Result};

/// How a loaded glyph is described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphFormat {
    /// Vector contours
    Outline,
    /// Pre-rendered bitmap embedded in the font
    Bitmap,
    /// Anything else (composite, SVG, ...)
    Other,
}

/// Result of loading a glyph into the face's slot
#[derive(Debug, Clone, Copy)]
pub struct LoadedGlyph {
    pub format: GlyphFormat,
    pub metrics: OutlineMetrics,
}

/// External outline rasterizer
pub trait Rasterizer {
    /// Opened font face
    type Face;

    fn open_face(&mut self, data: &[u8]) -> Result<Self::Face>;

    /// Set the nominal size in points at the given resolution
    fn set_char_size(&mut self, face: &mut Self::Face, point_size: u32, dpi: u32) -> Result<()>;

    /// Glyph index for a code point, 0 if the face has none
    fn glyph_index(&mut self, face: &mut Self::Face, code_point: u32) -> u32;

    /// Load a glyph into the face's slot
    fn load_glyph(&mut self, face: &mut Self::Face, index: u32) -> Result<LoadedGlyph>;

    /// Render the loaded outline into `target`, translated so the box
    /// origin (`left`, `bottom`) lands on the bitmap's bottom-left corner
    fn render_outline(
        &mut self,
        face: &mut Self::Face,
        bbox: &GlyphBox,
        target: &mut CoverageBitmap,
    ) -> Result<()>;

    fn close_face(&mut self, face: Self::Face);
}

/// Scratch bitmap for one glyph, rows top to bottom
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageBitmap {
    pub width: i32,
    pub height: i32,
    pub pitch: i32,
    pub mode: PixelMode,
    pub data: Vec<u8>,
}

impl CoverageBitmap {
    /// Zeroed bitmap sized for `bbox`
    pub fn for_box(bbox: &GlyphBox) -> Self {
        Self {
            width: bbox.width,
            height: bbox.height,
            pitch: bbox.pitch,
            mode: bbox.mode,
            data: vec![0; bbox.byte_len()],
        }
    }

    /// Width of the box this bitmap occupies on a page.
    ///
    /// Gray bitmaps take their padded pitch, mono bitmaps their pixel width.
    pub fn box_width(&self) -> i32 {
        match self.mode {
            PixelMode::Gray => self.pitch,
            PixelMode::Mono => self.width,
        }
    }

    /// One row of raw bytes
    pub fn row(&self, y: usize) -> &[u8] {
        let pitch = self.pitch.max(0) as usize;
        &self.data[y * pitch..(y + 1) * pitch]
    }

    /// Set coverage of a gray pixel (ignored outside the bitmap)
    pub fn put(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        match self.mode {
            PixelMode::Gray => {
                let idx = (y * self.pitch + x) as usize;
                self.data[idx] = value;
            }
            PixelMode::Mono => {
                let idx = (y * self.pitch + (x >> 3)) as usize;
                let mask = 0x80u8 >> (x & 7);
                if value >= 0x80 {
                    self.data[idx] |= mask;
                } else {
                    self.data[idx] &= !mask;
                }
            }
        }
    }
}

/// Rasterize one code point.
///
/// Fails with `NotFound` when the face has no glyph for it and with
/// `UnsupportedFormat` for non-outline glyphs; the caller leaves the
/// glyph zeroed and skips placement in both cases.
pub fn rasterize_glyph<R: Rasterizer>(
    rasterizer: &mut R,
    face: &mut R::Face,
    code_point: u32,
) -> Result<(CoverageBitmap, GlyphMetrics)> {
    rasterize_glyph_within(rasterizer, face, code_point, i32::MAX)
}

/// Like [`rasterize_glyph`], but fails with `CapacityExceeded` before
/// rendering when the glyph's box reaches `max_extent` in either
/// direction.
pub fn rasterize_glyph_within<R: Rasterizer>(
    rasterizer: &mut R,
    face: &mut R::Face,
    code_point: u32,
    max_extent: i32,
) -> Result<(CoverageBitmap, GlyphMetrics)> {
    let index = rasterizer.glyph_index(face, code_point);
    if index == 0 {
        debug!("Unrecognized character U+{:04X}", code_point);
        return Err(FontError::NotFound(format!("U+{:04X}", code_point)));
    }

    let loaded = rasterizer.load_glyph(face, index)?;
    if loaded.format != GlyphFormat::Outline {
        warn!("Non-outline glyphs are not supported (U+{:04X})", code_point);
        return Err(FontError::UnsupportedFormat(format!(
            "U+{:04X}: {:?}",
            code_point, loaded.format
        )));
    }

    let bbox = GlyphBox::from_metrics(&loaded.metrics, PixelMode::Gray);
    if bbox.pitch >= max_extent || bbox.height >= max_extent {
        return Err(FontError::CapacityExceeded(format!(
            "U+{:04X} is {}x{}, limit {}",
            code_point, bbox.pitch, bbox.height, max_extent
        )));
    }
    let mut bitmap = CoverageBitmap::for_box(&bbox);
    rasterizer.render_outline(face, &bbox, &mut bitmap)?;

    let metrics = GlyphMetrics {
        height: bbox.height,
        top: trunc64(loaded.metrics.bearing_y) as i32 + 1,
        bottom: trunc64(bbox.bottom) as i32,
        pitch: bbox.pitch,
        advance_x: trunc64(loaded.metrics.advance) as i32 + 1,
        ..GlyphMetrics::default()
    };

    Ok((bitmap, metrics))
}
