//! FreeType wrapper
//!
//! Production [`Rasterizer`] backed by freetype-rs.

use freetype::bitmap::PixelMode as FtPixelMode;
use freetype::face::LoadFlag;
use freetype::render_mode::RenderMode;
use freetype::Library;
use log::{debug, info};
use std::rc::Rc;

use super::fixed::{trunc64, GlyphBox, OutlineMetrics};
use super::rasterizer::{CoverageBitmap, GlyphFormat, LoadedGlyph, Rasterizer};
use crate::error::{FontError, Result};

/// Rendered bitmap borrowed from a FreeType glyph slot
struct SourceBitmap<'a> {
    buffer: &'a [u8],
    rows: usize,
    width: usize,
    pitch: usize,
    mono: bool,
}

impl SourceBitmap<'_> {
    fn coverage(&self, row: usize, col: usize) -> u8 {
        if self.mono {
            match self.buffer.get(row * self.pitch + (col >> 3)) {
                Some(byte) if byte & (0x80 >> (col & 7)) != 0 => 255,
                _ => 0,
            }
        } else {
            self.buffer.get(row * self.pitch + col).copied().unwrap_or(0)
        }
    }

    /// Copy every pixel to `target`, offset by (`dx`, `dy`)
    fn copy_into(&self, target: &mut CoverageBitmap, dx: i32, dy: i32) {
        for row in 0..self.rows {
            for col in 0..self.width {
                target.put(dx + col as i32, dy + row as i32, self.coverage(row, col));
            }
        }
    }
}

/// FreeType library handle
pub struct FtRasterizer {
    library: Library,
}

impl FtRasterizer {
    /// Initialize the FreeType library
    pub fn new() -> Result<Self> {
        let library = Library::init()
            .map_err(|e| FontError::Init(format!("FreeType initialization failed: {:?}", e)))?;
        info!("FreeType initialized");
        Ok(Self { library })
    }
}

impl std::fmt::Debug for FtRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtRasterizer").finish_non_exhaustive()
    }
}

impl Rasterizer for FtRasterizer {
    type Face = freetype::Face;

    fn open_face(&mut self, data: &[u8]) -> Result<Self::Face> {
        // freetype-rs requires Rc<Vec<u8>>
        let font_data: Rc<Vec<u8>> = Rc::new(data.to_vec());
        let face = self
            .library
            .new_memory_face(font_data, 0)
            .map_err(|e| FontError::Io(format!("unable to open face: {:?}", e)))?;

        let family = face.family_name().unwrap_or_else(|| "unknown".to_string());
        debug!("FreeType face opened: {}", family);
        Ok(face)
    }

    fn set_char_size(&mut self, face: &mut Self::Face, point_size: u32, dpi: u32) -> Result<()> {
        let size = (point_size as isize) << 6;
        face.set_char_size(size, size, dpi, dpi)
            .map_err(|e| FontError::Io(format!("unable to set face char size: {:?}", e)))
    }

    fn glyph_index(&mut self, face: &mut Self::Face, code_point: u32) -> u32 {
        // get_char_index returns None/0 if not found
        face.get_char_index(code_point as usize).unwrap_or(0)
    }

    fn load_glyph(&mut self, face: &mut Self::Face, index: u32) -> Result<LoadedGlyph> {
        face.load_glyph(index, LoadFlag::DEFAULT)
            .map_err(|e| FontError::Io(format!("unable to load glyph {}: {:?}", index, e)))?;

        let glyph = face.glyph();
        let m = glyph.metrics();
        let format = if glyph.outline().is_some() {
            GlyphFormat::Outline
        } else {
            GlyphFormat::Bitmap
        };

        Ok(LoadedGlyph {
            format,
            metrics: OutlineMetrics {
                width: m.width as i64,
                height: m.height as i64,
                bearing_x: m.horiBearingX as i64,
                bearing_y: m.horiBearingY as i64,
                advance: m.horiAdvance as i64,
            },
        })
    }

    fn render_outline(
        &mut self,
        face: &mut Self::Face,
        bbox: &GlyphBox,
        target: &mut CoverageBitmap,
    ) -> Result<()> {
        let glyph = face.glyph();
        glyph
            .render_glyph(RenderMode::Normal)
            .map_err(|e| FontError::Io(format!("unable to render glyph: {:?}", e)))?;

        let bitmap = glyph.bitmap();
        let source = SourceBitmap {
            buffer: bitmap.buffer(),
            rows: bitmap.rows().max(0) as usize,
            width: bitmap.width().max(0) as usize,
            pitch: bitmap.pitch().unsigned_abs() as usize,
            mono: matches!(bitmap.pixel_mode(), Ok(FtPixelMode::Mono)),
        };

        // FreeType places its bitmap by (bitmap_left, bitmap_top); shift it
        // into our box whose top-left corner is (left, top)
        let dx = glyph.bitmap_left() - trunc64(bbox.left) as i32;
        let dy = trunc64(bbox.top) as i32 - glyph.bitmap_top();
        source.copy_into(target, dx, dy);
        Ok(())
    }

    fn close_face(&mut self, face: Self::Face) {
        // FT_Done_Face runs on drop
        drop(face);
    }
}
