//! Shared fixtures: a deterministic rasterizer and an event-logging
//! texture registry

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glyphbake::assets::MemoryAssetStore;
use glyphbake::error::{FontError, Result};
use glyphbake::font::fixed::{GlyphBox, OutlineMetrics};
use glyphbake::font::rasterizer::{CoverageBitmap, GlyphFormat, LoadedGlyph, Rasterizer};
use glyphbake::font::texture::{DrawHandle, ImageHandle, ImageLibrary, TextureRegistry};

pub const FONT_PATH: &str = "fonts/test.ttf";

/// Ordered record of rasterizer and texture events
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Every glyph is a `width` x `height` block of coverage 200 with the
/// baseline two rows above the bottom edge
#[derive(Debug)]
pub struct FakeRasterizer {
    pub width: i64,
    pub height: i64,
    /// Code points without a glyph
    pub missing: HashSet<u32>,
    /// Code points stored as embedded bitmaps
    pub bitmap_only: HashSet<u32>,
    pub renders: usize,
    pub open_faces: usize,
    pub log: EventLog,
}

#[derive(Debug)]
pub struct FakeFace {
    pub point_size: u32,
}

impl FakeRasterizer {
    pub fn new(log: EventLog) -> Self {
        Self {
            width: 8,
            height: 10,
            missing: HashSet::new(),
            bitmap_only: HashSet::new(),
            renders: 0,
            open_faces: 0,
            log,
        }
    }
}

impl Rasterizer for FakeRasterizer {
    type Face = FakeFace;

    fn open_face(&mut self, data: &[u8]) -> Result<FakeFace> {
        if data.is_empty() {
            return Err(FontError::Io("empty font file".to_string()));
        }
        self.open_faces += 1;
        Ok(FakeFace { point_size: 0 })
    }

    fn set_char_size(&mut self, face: &mut FakeFace, point_size: u32, _dpi: u32) -> Result<()> {
        face.point_size = point_size;
        Ok(())
    }

    fn glyph_index(&mut self, _face: &mut FakeFace, code_point: u32) -> u32 {
        if self.missing.contains(&code_point) {
            0
        } else {
            code_point
        }
    }

    fn load_glyph(&mut self, _face: &mut FakeFace, index: u32) -> Result<LoadedGlyph> {
        let format = if self.bitmap_only.contains(&index) {
            GlyphFormat::Bitmap
        } else {
            GlyphFormat::Outline
        };
        Ok(LoadedGlyph {
            format,
            metrics: OutlineMetrics {
                width: self.width * 64,
                height: self.height * 64,
                bearing_x: 0,
                bearing_y: (self.height - 2) * 64,
                advance: self.width * 64,
            },
        })
    }

    fn render_outline(
        &mut self,
        _face: &mut FakeFace,
        bbox: &GlyphBox,
        target: &mut CoverageBitmap,
    ) -> Result<()> {
        for y in 0..bbox.height {
            for x in 0..bbox.width {
                target.put(x, y, 200);
            }
        }
        self.renders += 1;
        self.log.borrow_mut().push("render".to_string());
        Ok(())
    }

    fn close_face(&mut self, _face: FakeFace) {
        self.open_faces -= 1;
    }
}

/// `ImageLibrary` that records registrations and releases
#[derive(Debug, Default)]
pub struct LoggingTextures {
    pub inner: ImageLibrary,
    pub log: EventLog,
}

impl LoggingTextures {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: ImageLibrary::new(),
            log,
        }
    }
}

impl TextureRegistry for LoggingTextures {
    fn register_image(
        &mut self,
        name: &str,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<ImageHandle> {
        let handle = self.inner.register_image(name, rgba, width, height)?;
        self.log.borrow_mut().push(format!("register {}", name));
        Ok(handle)
    }

    fn register_draw_handle(&mut self, name: &str, image: ImageHandle) -> DrawHandle {
        self.inner.register_draw_handle(name, image)
    }

    fn resolve_draw_handle(&mut self, name: &str) -> DrawHandle {
        self.inner.resolve_draw_handle(name)
    }

    fn release_image(&mut self, image: ImageHandle) {
        let name = self
            .inner
            .get(image)
            .map(|img| img.name.clone())
            .unwrap_or_default();
        self.inner.release_image(image);
        self.log.borrow_mut().push(format!("release {}", name));
    }
}

pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Asset store holding one fake font file
pub fn assets_with_font() -> MemoryAssetStore {
    let mut assets = MemoryAssetStore::new();
    assets.insert(FONT_PATH, b"fake outline font".to_vec());
    assets
}
