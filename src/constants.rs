//! Global constants for glyphbake
//!
//! Glyph table geometry, page sizes and persisted layout sizes.
//! Anything that ends up in a `.dat` file lives here so the codec and
//! the registry agree on it.

// ============================================================================
// Glyph Table
// ============================================================================

/// Entries in every font table (indexed by raw byte value)
pub const GLYPHS_PER_FONT: usize = 256;

/// First code point rasterized into pre-baked atlases (space)
pub const GLYPH_START: u32 = 0x20;

/// Last code point rasterized into pre-baked atlases (tilde)
pub const GLYPH_END: u32 = 0x7E;

/// Maximum number of fonts the registry keeps
pub const MAX_FONTS: usize = 12;

/// Runtime glyph cache slots (one 32x32 image each)
pub const MAX_FACE_GLYPHS: usize = 256;

// ============================================================================
// Sizes
// ============================================================================

/// Point size the UI scale of 1.0 corresponds to
pub const REFERENCE_POINT_SIZE: f32 = 48.0;

/// Point size used when the caller passes zero or a negative size
pub const DEFAULT_POINT_SIZE: i32 = 12;

/// Rasterizer resolution; at 72 dpi one point is one pixel
pub const FONT_DPI: u32 = 72;

/// Side of one pre-baked atlas page in pixels
pub const ATLAS_PAGE_SIZE: u32 = 256;

/// Side of the page a single cached glyph is rendered onto
pub const GLYPH_PAGE_SIZE: u32 = 32;

/// Largest page the packer accepts (bounds the working buffer)
pub const MAX_PAGE_SIZE: u32 = 1024;

// ============================================================================
// Persisted Layout
// ============================================================================

/// Fixed name buffer for a glyph's page shader/image name
pub const SHADER_NAME_LEN: usize = 32;

/// Fixed name buffer for the font name (MAX_QPATH)
pub const FONT_NAME_LEN: usize = 64;

/// Bytes per persisted glyph: 12 x 32-bit fields + shader name
pub const GLYPH_RECORD_SIZE: usize = 12 * 4 + SHADER_NAME_LEN;

/// Exact size of a valid `.dat` font cache file
pub const FONT_FILE_SIZE: usize = GLYPHS_PER_FONT * GLYPH_RECORD_SIZE + 4 + FONT_NAME_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_file_size() {
        assert_eq!(GLYPH_RECORD_SIZE, 80);
        assert_eq!(FONT_FILE_SIZE, 20548);
    }
}
