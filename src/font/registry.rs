//! Pre-baked font registry
//!
//! Holds up to `max_fonts` complete glyph tables keyed by their cache
//! file name (`<font>_<size>.dat`). A font is built once:
//! 1. Persisted `.dat` blob from the asset store, if present and valid
//! 2. Otherwise rasterize the printable range, pack it into pages,
//!    register the pages and (optionally) persist everything
//!
//! Later registrations of the same key return a copy.

use log::{debug, info, warn};
use std::collections::HashMap;

use super::cache::GlyphCache;
use super::codec::{self, ByteOrder};
use super::compositor::{composite, register_page};
use super::face::{clamp_point_size, glyph_scale_for, open_face, Face, FaceId};
use super::glyph::{FontTable, GlyphMetrics};
use super::packer::{AtlasPacker, Placement, RowHeightPolicy};
use super::rasterizer::{rasterize_glyph_within, CoverageBitmap, Rasterizer};
use super::texture::{DrawHandle, TextureRegistry};
use super::tga::{decode_tga, encode_tga};
use crate::assets::AssetStore;
use crate::constants::{
    ATLAS_PAGE_SIZE, FONT_DPI, GLYPHS_PER_FONT, GLYPH_END, GLYPH_START, MAX_FONTS,
};
use crate::error::{FontError, Result};

/// Registry behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub max_fonts: usize,
    pub page_size: u32,
    pub row_height_policy: RowHeightPolicy,
    pub byte_order: ByteOrder,
    /// Write freshly built `.dat` and `.tga` files (never overwrites)
    pub save_font_data: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_fonts: MAX_FONTS,
            page_size: ATLAS_PAGE_SIZE,
            row_height_policy: RowHeightPolicy::Page,
            byte_order: ByteOrder::Little,
            save_font_data: false,
        }
    }
}

/// Strip a trailing `.ext` from the last path component
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if !name[dot..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// Cache file name for a font at a point size.
///
/// Names without an extension are legacy built-in fonts and map to
/// `fonts/fontImage_<size>.dat`.
pub fn cache_key(font_name: &str, point_size: u32) -> String {
    let stripped = strip_extension(font_name);
    if stripped == font_name {
        format!("fonts/fontImage_{}.dat", point_size)
    } else {
        format!("{}_{}.dat", stripped, point_size)
    }
}

/// Name of one atlas page image
pub fn page_name(font_name: &str, page: usize, point_size: u32) -> String {
    format!("{}_{}_{}.tga", strip_extension(font_name), page, point_size)
}

/// Table of registered fonts plus the optional rasterizer
#[derive(Debug)]
pub struct FontRegistry<R: Rasterizer> {
    fonts: Vec<FontTable>,
    rasterizer: Option<R>,
    settings: RegistrySettings,
    next_face: u32,
}

impl<R: Rasterizer> FontRegistry<R> {
    /// Start with an empty registry. Without a rasterizer only persisted
    /// `.dat` files can be served.
    pub fn new(rasterizer: Option<R>, settings: RegistrySettings) -> Self {
        if rasterizer.is_none() {
            info!("Font registry: no rasterizer, persisted fonts only");
        }
        Self {
            fonts: Vec::new(),
            rasterizer,
            settings,
            next_face: 0,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn rasterizer(&self) -> Option<&R> {
        self.rasterizer.as_ref()
    }

    pub fn rasterizer_mut(&mut self) -> Option<&mut R> {
        self.rasterizer.as_mut()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn fonts(&self) -> &[FontTable] {
        &self.fonts
    }

    /// Registered font by cache key (case-insensitive)
    pub fn find(&self, key: &str) -> Option<&FontTable> {
        self.fonts.iter().find(|f| f.name.eq_ignore_ascii_case(key))
    }

    /// Register a font, returning an all-zero table on failure
    pub fn register_font<T: TextureRegistry, A: AssetStore>(
        &mut self,
        font_name: &str,
        point_size: i32,
        textures: &mut T,
        assets: &mut A,
    ) -> FontTable {
        match self.try_register_font(font_name, point_size, textures, assets) {
            Ok(table) => table,
            Err(e) => {
                warn!("register_font {} {}: {}", font_name, point_size, e);
                FontTable::default()
            }
        }
    }

    /// Register a font, reporting why it failed
    pub fn try_register_font<T: TextureRegistry, A: AssetStore>(
        &mut self,
        font_name: &str,
        point_size: i32,
        textures: &mut T,
        assets: &mut A,
    ) -> Result<FontTable> {
        if font_name.is_empty() {
            return Err(FontError::NotFound("called with empty name".to_string()));
        }
        let point_size = clamp_point_size(point_size);
        let key = cache_key(font_name, point_size);

        if let Some(font) = self.find(&key) {
            debug!("Font already registered: {}", key);
            return Ok(font.clone());
        }

        if self.fonts.len() >= self.settings.max_fonts {
            return Err(FontError::CapacityExceeded(format!(
                "too many fonts registered already ({})",
                self.settings.max_fonts
            )));
        }

        match self.load_persisted(&key, textures, assets) {
            Ok(table) => {
                info!("Font loaded from cache: {}", key);
                self.fonts.push(table.clone());
                return Ok(table);
            }
            Err(FontError::NotFound(_)) => debug!("No cached font data: {}", key),
            Err(e) => warn!("Ignoring cached font data {}: {}", key, e),
        }

        let table = self.build_font(font_name, point_size, &key, textures, assets)?;
        self.fonts.push(table.clone());

        if self.settings.save_font_data && !assets.exists(&key) {
            let bytes = codec::encode(&table, self.settings.byte_order);
            if let Err(e) = assets.write_all(&key, &bytes) {
                warn!("Unable to save font data {}: {}", key, e);
            }
        }
        Ok(table)
    }

    fn load_persisted<T: TextureRegistry, A: AssetStore>(
        &self,
        key: &str,
        textures: &mut T,
        assets: &mut A,
    ) -> Result<FontTable> {
        let bytes = assets.read_all(key)?;
        let mut table = codec::decode(&bytes, self.settings.byte_order)?;
        table.name = key.to_string();
        resolve_handles(&mut table, textures, assets);
        Ok(table)
    }

    fn build_font<T: TextureRegistry, A: AssetStore>(
        &mut self,
        font_name: &str,
        point_size: u32,
        key: &str,
        textures: &mut T,
        assets: &mut A,
    ) -> Result<FontTable> {
        let settings = self.settings.clone();
        let rasterizer = self
            .rasterizer
            .as_mut()
            .ok_or_else(|| FontError::Init("rasterizer not available".to_string()))?;

        let data = assets.read_all(font_name).map_err(|e| match e {
            FontError::NotFound(p) => FontError::Io(format!("unable to read font file {}", p)),
            other => other,
        })?;

        let mut face = rasterizer.open_face(&data)?;
        if let Err(e) = rasterizer.set_char_size(&mut face, point_size, FONT_DPI) {
            rasterizer.close_face(face);
            return Err(e);
        }

        let baked = bake_pages(
            rasterizer,
            &mut face,
            &settings,
            font_name,
            point_size,
            textures,
            assets,
        );
        rasterizer.close_face(face);
        let glyphs = baked?;

        info!("Font built: {} ({}pt)", key, point_size);
        Ok(FontTable {
            glyphs,
            glyph_scale: glyph_scale_for(point_size),
            name: key.to_string(),
        })
    }

    /// Re-resolve every font's draw handles by page name, e.g. after a
    /// renderer restart. Pages the renderer no longer has are reloaded
    /// from their saved `.tga`.
    pub fn rebind_images<T: TextureRegistry, A: AssetStore>(
        &mut self,
        textures: &mut T,
        assets: &mut A,
    ) {
        for font in &mut self.fonts {
            resolve_handles(font, textures, assets);
        }
    }

    /// Open a face for on-demand glyphs
    pub fn load_face<A: AssetStore>(
        &mut self,
        path: &str,
        point_size: i32,
        assets: &mut A,
    ) -> Result<Face<R::Face>> {
        let rasterizer = self
            .rasterizer
            .as_mut()
            .ok_or_else(|| FontError::Init("rasterizer not available".to_string()))?;
        let data = assets.read_all(path)?;
        self.next_face += 1;
        open_face(rasterizer, FaceId(self.next_face), &data, point_size, path)
    }

    /// Release a face and every cached glyph rendered from it
    pub fn free_face<T: TextureRegistry>(
        &mut self,
        face: Face<R::Face>,
        cache: &mut GlyphCache,
        textures: &mut T,
    ) {
        cache.free_cached_glyphs(face.id(), textures);
        debug!("Face freed: {} ({}pt)", face.name(), face.point_size());
        if let Some(rasterizer) = self.rasterizer.as_mut() {
            rasterizer.close_face(face.into_raw());
        }
    }

    /// Tear down: empty the glyph cache, forget fonts, drop the rasterizer
    pub fn shutdown<T: TextureRegistry>(&mut self, cache: &mut GlyphCache, textures: &mut T) {
        cache.clear(textures);
        self.fonts.clear();
        self.rasterizer = None;
        info!("Font registry shut down");
    }
}

/// Look up each distinct page name once, loading unknown pages from
/// the asset store
fn resolve_handles<T: TextureRegistry, A: AssetStore>(
    table: &mut FontTable,
    textures: &mut T,
    assets: &mut A,
) {
    let mut resolved = HashMap::new();
    for glyph in &mut table.glyphs {
        if glyph.shader_name.is_empty() {
            continue;
        }
        let name = glyph.shader_name.clone();
        let draw = *resolved.entry(name.clone()).or_insert_with(|| {
            let draw = textures.resolve_draw_handle(&name);
            if !draw.is_none() {
                return draw;
            }
            match load_page(&name, textures, assets) {
                Ok(draw) => draw,
                Err(e) => {
                    warn!("Font page {} unavailable: {}", name, e);
                    DrawHandle::NONE
                }
            }
        });
        glyph.draw = draw;
    }
}

/// Register a saved page image
fn load_page<T: TextureRegistry, A: AssetStore>(
    name: &str,
    textures: &mut T,
    assets: &mut A,
) -> Result<DrawHandle> {
    let (rgba, width, height) = decode_tga(&assets.read_all(name)?)?;
    if width != height {
        return Err(FontError::Corrupt(format!(
            "page {} is {}x{}, expected a square",
            name, width, height
        )));
    }
    let page = register_page(textures, name, rgba, width)?;
    debug!("Font page reloaded: {}", name);
    Ok(page.draw)
}

/// Rasterize the printable range and pack it into as many pages as needed
fn bake_pages<R: Rasterizer, T: TextureRegistry, A: AssetStore>(
    rasterizer: &mut R,
    face: &mut R::Face,
    settings: &RegistrySettings,
    font_name: &str,
    point_size: u32,
    textures: &mut T,
    assets: &mut A,
) -> Result<Vec<GlyphMetrics>> {
    let mut packer = AtlasPacker::new(settings.page_size, settings.row_height_policy)?;
    let mut glyphs = vec![GlyphMetrics::default(); GLYPHS_PER_FONT];

    // Measurement pass; the bitmaps are kept for the packing pass. A glyph
    // fits an empty page only below page_size - 2 in both directions.
    let max_extent = settings.page_size as i32 - 2;
    let mut pending: Vec<(u32, CoverageBitmap, GlyphMetrics)> = Vec::new();
    for code_point in GLYPH_START..=GLYPH_END {
        match rasterize_glyph_within(rasterizer, face, code_point, max_extent) {
            Ok((bitmap, metrics)) => {
                packer.measure(metrics.height);
                pending.push((code_point, bitmap, metrics));
            }
            Err(e @ FontError::CapacityExceeded(_)) => {
                warn!("Skipping U+{:04X} on a {}px page: {}", code_point, settings.page_size, e)
            }
            Err(e) => debug!("Skipping U+{:04X}: {}", code_point, e),
        }
    }
    debug!(
        "Measured {} glyphs, max height {}",
        pending.len(),
        packer.measured_height()
    );

    let mut page = Page {
        index: 0,
        glyphs: Vec::new(),
    };
    let mut queue = pending.into_iter();
    let mut current = queue.next();
    while let Some((code_point, bitmap, mut metrics)) = current.take() {
        match packer.place(&bitmap) {
            Placement::Placed { s, t, s2, t2, .. } => {
                metrics.image_width = bitmap.box_width();
                metrics.image_height = bitmap.height;
                metrics.s = s;
                metrics.t = t;
                metrics.s2 = s2;
                metrics.t2 = t2;
                glyphs[code_point as usize] = metrics;
                page.glyphs.push(code_point as usize);
                current = queue.next();
            }
            Placement::PageFull if packer.is_empty() => {
                warn!(
                    "Glyph U+{:04X} ({}x{}) is larger than a {}px page",
                    code_point,
                    bitmap.box_width(),
                    bitmap.height,
                    packer.page_size()
                );
                current = queue.next();
            }
            Placement::PageFull => {
                page.flush(&mut packer, &mut glyphs, settings, font_name, point_size, textures, assets)?;
                // Retry the same glyph on the fresh page
                current = Some((code_point, bitmap, metrics));
            }
        }
    }

    if !page.glyphs.is_empty() {
        page.flush(&mut packer, &mut glyphs, settings, font_name, point_size, textures, assets)?;
    }
    Ok(glyphs)
}

/// Glyphs placed on the page currently being packed
struct Page {
    index: usize,
    glyphs: Vec<usize>,
}

impl Page {
    /// Composite, persist and register the page, point its glyphs at it,
    /// then start the next one
    #[allow(clippy::too_many_arguments)]
    fn flush<T: TextureRegistry, A: AssetStore>(
        &mut self,
        packer: &mut AtlasPacker,
        glyphs: &mut [GlyphMetrics],
        settings: &RegistrySettings,
        font_name: &str,
        point_size: u32,
        textures: &mut T,
        assets: &mut A,
    ) -> Result<()> {
        let name = page_name(font_name, self.index, point_size);
        let size = packer.page_size();
        let rgba = composite(packer.pixels());

        if settings.save_font_data && !assets.exists(&name) {
            let tga = encode_tga(&rgba, size as u16, size as u16);
            if let Err(e) = assets.write_all(&name, &tga) {
                warn!("Unable to save font page {}: {}", name, e);
            }
        }

        let page = register_page(textures, &name, rgba, size)?;
        for &i in &self.glyphs {
            glyphs[i].draw = page.draw;
            glyphs[i].shader_name = page.name.clone();
        }
        debug!("Page {} flushed with {} glyphs", name, self.glyphs.len());

        packer.reset();
        self.glyphs.clear();
        self.index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("fonts/arial.ttf"), "fonts/arial");
        assert_eq!(strip_extension("fonts/arial"), "fonts/arial");
        assert_eq!(strip_extension("fonts.d/arial"), "fonts.d/arial");
        assert_eq!(strip_extension("a.b.ttf"), "a.b");
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("fonts/arial.ttf", 16), "fonts/arial_16.dat");
        assert_eq!(cache_key("courier.TTF", 12), "courier_12.dat");
        assert_eq!(cache_key("fonts/veramono", 12), "fonts/fontImage_12.dat");
    }

    #[test]
    fn test_page_name() {
        assert_eq!(page_name("fonts/arial.ttf", 2, 16), "fonts/arial_2_16.tga");
    }
}
