//! Font loading and glyph atlas management
//!
//! Handles:
//! - 26.6 fixed-point glyph boxes and rasterization through a backend
//! - Shelf packing of glyphs into square atlas pages
//! - Page compositing and registration with the renderer
//! - Persisted font tables (`.dat`) and page images (`.tga`)
//! - A bounded ring cache for on-demand multi-byte glyphs

pub mod cache;
pub mod codec;
pub mod compositor;
pub mod face;
pub mod fixed;
#[cfg(feature = "freetype")]
pub mod freetype;
pub mod glyph;
pub mod packer;
pub mod rasterizer;
pub mod registry;
pub mod texture;
pub mod tga;

pub use cache::GlyphCache;
pub use face::{Face, FaceId};
#[cfg(feature = "freetype")]
pub use freetype::FtRasterizer;
pub use glyph::{FontTable, GlyphMetrics};
pub use rasterizer::Rasterizer;
pub use registry::{FontRegistry, RegistrySettings};
pub use texture::{DrawHandle, ImageHandle, ImageLibrary, TextureRegistry};
