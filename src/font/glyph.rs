//! Glyph metrics and font tables

use smol_str::SmolStr;

use super::texture::DrawHandle;
use crate::constants::GLYPHS_PER_FONT;

/// Metrics and texture coordinates for one glyph
///
/// A glyph that failed to rasterize is all zero (`Default`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Bitmap height (pixels)
    pub height: i32,
    /// Distance from baseline to the top row, plus one
    pub top: i32,
    /// Distance from baseline to the bottom edge (negative below baseline)
    pub bottom: i32,
    /// Bytes per bitmap row
    pub pitch: i32,
    /// Horizontal advance (pixels, plus one)
    pub advance_x: i32,
    /// Box occupied on the page (pixels)
    pub image_width: i32,
    pub image_height: i32,
    /// Texture coordinates within the page (0.0-1.0)
    pub s: f32,
    pub t: f32,
    pub s2: f32,
    pub t2: f32,
    /// Draw handle of the page; process-local, never persisted as data
    pub draw: DrawHandle,
    /// Name of the page image, resolves `draw` after a reload
    pub shader_name: SmolStr,
}

/// Complete glyph table for one (font, point size)
#[derive(Debug, Clone, PartialEq)]
pub struct FontTable {
    /// Indexed by raw byte value
    pub glyphs: Vec<GlyphMetrics>,
    /// Scale relative to a 48 point font
    pub glyph_scale: f32,
    /// Canonical cache-file name, also the registry key
    pub name: String,
}

impl Default for FontTable {
    fn default() -> Self {
        Self {
            glyphs: vec![GlyphMetrics::default(); GLYPHS_PER_FONT],
            glyph_scale: 0.0,
            name: String::new(),
        }
    }
}

impl FontTable {
    /// Glyph for a raw byte
    pub fn glyph(&self, byte: u8) -> &GlyphMetrics {
        &self.glyphs[byte as usize]
    }

    /// True for the zeroed table returned on failure
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
