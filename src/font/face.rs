//! Opened font faces for on-demand glyph rendering

use log::{info, warn};

use super::rasterizer::Rasterizer;
use crate::constants::{DEFAULT_POINT_SIZE, FONT_DPI, REFERENCE_POINT_SIZE};
use crate::error::Result;

/// Identity of a face, used to tag glyph cache slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

/// A face opened at one point size
#[derive(Debug)]
pub struct Face<F> {
    id: FaceId,
    raw: F,
    point_size: u32,
    glyph_scale: f32,
    name: String,
}

impl<F> Face<F> {
    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn raw_mut(&mut self) -> &mut F {
        &mut self.raw
    }

    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    /// Scale relative to a 48 point font
    pub fn glyph_scale(&self) -> f32 {
        self.glyph_scale
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_raw(self) -> F {
        self.raw
    }
}

/// Point sizes of zero or less fall back to the default
pub fn clamp_point_size(point_size: i32) -> u32 {
    if point_size <= 0 {
        DEFAULT_POINT_SIZE as u32
    } else {
        point_size as u32
    }
}

/// Glyph scale relative to the 48 point reference at 72 dpi
pub fn glyph_scale_for(point_size: u32) -> f32 {
    let dpi_scale = 72.0 / FONT_DPI as f32;
    dpi_scale * (REFERENCE_POINT_SIZE / point_size as f32)
}

/// Open a face from font bytes and size it
pub fn open_face<R: Rasterizer>(
    rasterizer: &mut R,
    id: FaceId,
    data: &[u8],
    point_size: i32,
    name: &str,
) -> Result<Face<R::Face>> {
    let point_size = clamp_point_size(point_size);
    let mut raw = rasterizer.open_face(data)?;
    if let Err(e) = rasterizer.set_char_size(&mut raw, point_size, FONT_DPI) {
        warn!("Face {}: {}", name, e);
        rasterizer.close_face(raw);
        return Err(e);
    }
    info!("Face loaded: {} ({}pt)", name, point_size);
    Ok(Face {
        id,
        raw,
        point_size,
        glyph_scale: glyph_scale_for(point_size),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_size_clamp() {
        assert_eq!(clamp_point_size(0), 12);
        assert_eq!(clamp_point_size(-5), 12);
        assert_eq!(clamp_point_size(16), 16);
    }

    #[test]
    fn test_glyph_scale() {
        assert_eq!(glyph_scale_for(48), 1.0);
        assert_eq!(glyph_scale_for(16), 3.0);
        assert_eq!(glyph_scale_for(12), 4.0);
    }
}
