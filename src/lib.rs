//! glyphbake - glyph atlas builder and runtime glyph cache
//!
//! Bakes the printable ASCII range of a TrueType/OpenType font into
//! square texture pages, persists the layout as `.dat`/`.tga` assets,
//! and renders other characters one at a time into a bounded cache.

pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod font;

pub use error::{FontError, Result};
