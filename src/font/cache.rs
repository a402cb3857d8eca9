//! Runtime glyph cache
//!
//! Multi-byte characters outside the pre-baked table are rendered one
//! at a time onto a small page and kept in a fixed ring of slots.
//! Eviction is round-robin: the ring cursor always points at the
//! oldest insertion, regardless of how often entries are hit.

use log::{debug, warn};
use smol_str::SmolStr;

use super::compositor::{composite, register_page};
use super::face::{Face, FaceId};
use super::glyph::{FontTable, GlyphMetrics};
use super::packer::{AtlasPacker, Placement, RowHeightPolicy};
use super::rasterizer::{rasterize_glyph_within, Rasterizer};
use super::texture::{ImageHandle, TextureRegistry};
use crate::error::{FontError, Result};

/// One ring slot
#[derive(Debug, Clone, Default)]
struct CacheSlot {
    used: bool,
    /// Encoded character (1-4 bytes)
    text: SmolStr,
    glyph: GlyphMetrics,
    face: Option<FaceId>,
    /// Backing image; `None` while `used` means it was freed behind our back
    image: Option<ImageHandle>,
}

/// Bounded ring of rendered single glyphs
#[derive(Debug)]
pub struct GlyphCache {
    slots: Vec<CacheSlot>,
    /// Ring cursor: next slot to fill
    next: usize,
    /// Working page for one glyph
    packer: AtlasPacker,
}

impl GlyphCache {
    pub fn new(capacity: usize, page_size: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(FontError::CapacityExceeded(
                "glyph cache needs at least one slot".to_string(),
            ));
        }
        Ok(Self {
            slots: vec![CacheSlot::default(); capacity],
            next: 0,
            packer: AtlasPacker::new(page_size, RowHeightPolicy::Page)?,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next miss will fill
    pub fn cursor(&self) -> usize {
        self.next
    }

    /// Number of slots in use
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.used).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached text of a slot, if in use
    pub fn slot_text(&self, slot: usize) -> Option<&str> {
        self.slots
            .get(slot)
            .filter(|s| s.used)
            .map(|s| s.text.as_str())
    }

    /// Backing image of a slot
    pub fn slot_image(&self, slot: usize) -> Option<ImageHandle> {
        self.slots.get(slot).and_then(|s| s.image)
    }

    /// Single-byte fast path: index the pre-baked table directly
    pub fn ascii_glyph(font: &FontTable, text: &str) -> GlyphMetrics {
        let byte = text.as_bytes().first().copied().unwrap_or(0);
        font.glyph(byte).clone()
    }

    /// Glyph for the first character of `text`.
    ///
    /// Single-byte characters (and calls without a rasterizer) come from
    /// `font`; everything else goes through the ring. Failures return a
    /// zeroed glyph.
    pub fn glyph<R: Rasterizer, T: TextureRegistry>(
        &mut self,
        font: &FontTable,
        face: &mut Face<R::Face>,
        rasterizer: Option<&mut R>,
        textures: &mut T,
        text: &str,
    ) -> GlyphMetrics {
        let width = text.chars().next().map_or(0, char::len_utf8);
        let rasterizer = match rasterizer {
            Some(r) if width > 1 => r,
            _ => return Self::ascii_glyph(font, text),
        };
        let key = &text[..width];

        if let Some(hit) = self.lookup(face.id(), key) {
            return hit;
        }

        let slot = self.next;
        if self.slots[slot].used {
            debug!("Evicting glyph cache slot {} ({})", slot, self.slots[slot].text);
            self.free_glyph(slot, textures);
            self.slots[slot].used = false;
        }

        match self.load_glyph(slot, face, rasterizer, textures, key) {
            Ok(glyph) => {
                let entry = &mut self.slots[slot];
                entry.used = true;
                entry.text = SmolStr::new(key);
                entry.face = Some(face.id());
                self.next = (slot + 1) % self.slots.len();
                glyph
            }
            Err(e) => {
                debug!("Glyph {:?} not cached: {}", key, e);
                GlyphMetrics::default()
            }
        }
    }

    /// Exact-match scan over one face's slots
    fn lookup(&mut self, face: FaceId, key: &str) -> Option<GlyphMetrics> {
        for slot in self.slots.iter_mut() {
            if !slot.used || slot.face != Some(face) {
                continue;
            }
            if slot.image.is_none() {
                // was freed
                slot.used = false;
                continue;
            }
            if slot.text == key {
                return Some(slot.glyph.clone());
            }
        }
        None
    }

    /// Render one character into `slot`, replacing its previous image
    pub fn load_glyph<R: Rasterizer, T: TextureRegistry>(
        &mut self,
        slot: usize,
        face: &mut Face<R::Face>,
        rasterizer: &mut R,
        textures: &mut T,
        text: &str,
    ) -> Result<GlyphMetrics> {
        if slot >= self.slots.len() {
            warn!("load_glyph: slot {} >= {}", slot, self.slots.len());
            return Err(FontError::CapacityExceeded(format!("slot {}", slot)));
        }
        let code_point = text
            .chars()
            .next()
            .map(u32::from)
            .ok_or_else(|| FontError::NotFound("empty string".to_string()))?;

        self.free_glyph(slot, textures);
        self.packer.reset();

        let max_extent = self.packer.page_size() as i32 - 2;
        let (bitmap, mut glyph) =
            rasterize_glyph_within(rasterizer, face.raw_mut(), code_point, max_extent)?;
        match self.packer.place(&bitmap) {
            Placement::Placed { s, t, s2, t2, .. } => {
                glyph.image_width = bitmap.box_width();
                glyph.image_height = bitmap.height;
                glyph.s = s;
                glyph.t = t;
                glyph.s2 = s2;
                glyph.t2 = t2;
            }
            Placement::PageFull => {
                self.packer.reset();
                return Err(FontError::CapacityExceeded(format!(
                    "U+{:04X} does not fit a {}px page",
                    code_point,
                    self.packer.page_size()
                )));
            }
        }

        let name = format!("*glyphcache_{}", slot);
        // The working page is cleared before every glyph, so scanning the
        // whole page for the stretch maximum only sees this glyph
        let rgba = composite(self.packer.pixels());
        let page = register_page(textures, &name, rgba, self.packer.page_size());
        self.packer.reset();
        let page = page?;

        glyph.draw = page.draw;
        glyph.shader_name = page.name;
        let entry = &mut self.slots[slot];
        entry.image = Some(page.image);
        entry.glyph = glyph.clone();
        Ok(glyph)
    }

    /// Release a slot's image. The slot keeps its `used` flag; the next
    /// lookup notices the missing image and drops it.
    pub fn free_glyph<T: TextureRegistry>(&mut self, slot: usize, textures: &mut T) {
        let Some(entry) = self.slots.get_mut(slot) else {
            warn!("free_glyph: slot {} out of range", slot);
            return;
        };
        if let Some(image) = entry.image.take() {
            textures.release_image(image);
        }
    }

    /// Drop every slot belonging to `face`
    pub fn free_cached_glyphs<T: TextureRegistry>(&mut self, face: FaceId, textures: &mut T) {
        for i in 0..self.slots.len() {
            if self.slots[i].used && self.slots[i].face == Some(face) {
                self.slots[i].used = false;
                self.free_glyph(i, textures);
            }
        }
    }

    /// Drop every slot
    pub fn clear<T: TextureRegistry>(&mut self, textures: &mut T) {
        for i in 0..self.slots.len() {
            if self.slots[i].used {
                self.slots[i].used = false;
                self.free_glyph(i, textures);
            }
        }
    }
}
