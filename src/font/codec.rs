//! Font cache binary codec
//!
//! Layout of a `.dat` file, no padding:
//!
//! ```text
//! GLYPHS_PER_FONT x {
//!     height, top, bottom, pitch, advance_x, image_width, image_height : i32
//!     s, t, s2, t2                                                   : f32
//!     draw handle                                                    : i32 (ignored on read)
//!     shader name                                                    : [u8; 32], NUL padded
//! }
//! glyph_scale : f32
//! font name   : [u8; 64], NUL padded
//! ```
//!
//! Byte order is a parameter; files in the wild are little-endian.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::glyph::{FontTable, GlyphMetrics};
use super::texture::DrawHandle;
use crate::constants::{FONT_FILE_SIZE, FONT_NAME_LEN, GLYPHS_PER_FONT, SHADER_NAME_LEN};
use crate::error::{FontError, Result};

/// Byte order of 32-bit fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    fn put_u32(self, out: &mut Vec<u8>, v: u32) {
        match self {
            Self::Little => out.extend_from_slice(&v.to_le_bytes()),
            Self::Big => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn get_u32(self, b: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        }
    }

    pub fn write_i32(self, out: &mut Vec<u8>, v: i32) {
        self.put_u32(out, v as u32);
    }

    pub fn write_f32(self, out: &mut Vec<u8>, v: f32) {
        self.put_u32(out, v.to_bits());
    }

    pub fn read_i32(self, b: [u8; 4]) -> i32 {
        self.get_u32(b) as i32
    }

    pub fn read_f32(self, b: [u8; 4]) -> f32 {
        f32::from_bits(self.get_u32(b))
    }
}

/// Encode a font table
pub fn encode(table: &FontTable, order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(FONT_FILE_SIZE);
    let empty = GlyphMetrics::default();

    for i in 0..GLYPHS_PER_FONT {
        let g = table.glyphs.get(i).unwrap_or(&empty);
        for v in [
            g.height,
            g.top,
            g.bottom,
            g.pitch,
            g.advance_x,
            g.image_width,
            g.image_height,
        ] {
            order.write_i32(&mut out, v);
        }
        for v in [g.s, g.t, g.s2, g.t2] {
            order.write_f32(&mut out, v);
        }
        order.write_i32(&mut out, g.draw.0);
        write_name(&mut out, &g.shader_name, SHADER_NAME_LEN);
    }

    order.write_f32(&mut out, table.glyph_scale);
    write_name(&mut out, &table.name, FONT_NAME_LEN);
    debug_assert_eq!(out.len(), FONT_FILE_SIZE);
    out
}

/// Decode a font table. Draw handles come back as `DrawHandle::NONE`
/// and must be re-resolved from `shader_name`.
pub fn decode(bytes: &[u8], order: ByteOrder) -> Result<FontTable> {
    if bytes.len() != FONT_FILE_SIZE {
        return Err(FontError::Corrupt(format!(
            "font data is {} bytes, expected {}",
            bytes.len(),
            FONT_FILE_SIZE
        )));
    }

    let mut r = Reader { bytes, pos: 0, order };
    let mut glyphs = Vec::with_capacity(GLYPHS_PER_FONT);
    for _ in 0..GLYPHS_PER_FONT {
        let height = r.i32();
        let top = r.i32();
        let bottom = r.i32();
        let pitch = r.i32();
        let advance_x = r.i32();
        let image_width = r.i32();
        let image_height = r.i32();
        let s = r.f32();
        let t = r.f32();
        let s2 = r.f32();
        let t2 = r.f32();
        // Process-local handle from the writer
        let _ = r.i32();
        let shader_name = SmolStr::new(r.name(SHADER_NAME_LEN));
        glyphs.push(GlyphMetrics {
            height,
            top,
            bottom,
            pitch,
            advance_x,
            image_width,
            image_height,
            s,
            t,
            s2,
            t2,
            draw: DrawHandle::NONE,
            shader_name,
        });
    }
    let glyph_scale = r.f32();
    let name = r.name(FONT_NAME_LEN);

    Ok(FontTable {
        glyphs,
        glyph_scale,
        name,
    })
}

/// NUL-padded fixed buffer, truncated on a char boundary
fn write_name(out: &mut Vec<u8>, name: &str, len: usize) {
    let mut end = 0;
    for (i, ch) in name.char_indices() {
        if i + ch.len_utf8() > len - 1 {
            break;
        }
        end = i + ch.len_utf8();
    }
    out.extend_from_slice(&name.as_bytes()[..end]);
    out.resize(out.len() + (len - end), 0);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl Reader<'_> {
    fn word(&mut self) -> [u8; 4] {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        b
    }

    fn i32(&mut self) -> i32 {
        let b = self.word();
        self.order.read_i32(b)
    }

    fn f32(&mut self) -> f32 {
        let b = self.word();
        self.order.read_f32(b)
    }

    fn name(&mut self, len: usize) -> String {
        let buf = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(len);
        String::from_utf8_lossy(&buf[..end]).into_owned()
    }
}
