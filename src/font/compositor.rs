//! Page compositor
//!
//! Promotes an 8-bit coverage page to RGBA (white with coverage as
//! alpha), stretched so the page's strongest coverage becomes opaque,
//! then registers it with the texture registry.

use log::debug;
use smol_str::SmolStr;

use super::texture::{DrawHandle, ImageHandle, TextureRegistry};
use crate::error::Result;

/// Page as registered with the texture registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub image: ImageHandle,
    pub draw: DrawHandle,
    pub name: SmolStr,
}

/// Coverage to RGBA with contrast stretch
pub fn composite(coverage: &[u8]) -> Vec<u8> {
    let max = coverage.iter().copied().max().unwrap_or(0);
    let scale = if max > 0 { 255.0 / max as f32 } else { 0.0 };

    let mut rgba = Vec::with_capacity(coverage.len() * 4);
    for &c in coverage {
        rgba.extend_from_slice(&[255, 255, 255, (c as f32 * scale) as u8]);
    }
    rgba
}

/// Hand a composited page to the texture registry, which takes the buffer
pub fn register_page<T: TextureRegistry>(
    textures: &mut T,
    name: &str,
    rgba: Vec<u8>,
    size: u32,
) -> Result<PageRef> {
    let image = textures.register_image(name, rgba, size, size)?;
    let draw = textures.register_draw_handle(name, image);
    debug!("Page registered: {} ({}x{})", name, size, size);
    Ok(PageRef {
        image,
        draw,
        name: SmolStr::new(name),
    })
}
