//! Configuration file management
//!
//! Loads TOML configuration files and provides baking settings.
//! Default config path: ~/.config/glyphbake/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{ATLAS_PAGE_SIZE, GLYPH_PAGE_SIZE, MAX_FACE_GLYPHS, MAX_FONTS, MAX_PAGE_SIZE};
use crate::font::cache::GlyphCache;
use crate::font::codec::ByteOrder;
use crate::font::packer::RowHeightPolicy;
use crate::font::registry::RegistrySettings;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pre-baked atlas settings
    pub atlas: AtlasConfig,
    /// Runtime glyph cache settings
    pub cache: CacheConfig,
    /// Asset store settings
    pub assets: AssetsConfig,
}

/// Pre-baked atlas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Write `.dat` and `.tga` files for freshly built fonts
    pub save_font_data: bool,
    /// Side length of an atlas page in pixels
    pub page_size: u32,
    /// Shelf height: "page" (tallest glyph of the font) or "row"
    pub row_height_policy: RowHeightPolicy,
    /// Byte order of `.dat` files: "little" or "big"
    pub byte_order: ByteOrder,
    /// Maximum number of registered fonts
    pub max_fonts: usize,
}

/// Runtime glyph cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of ring slots
    pub capacity: usize,
    /// Side length of the per-glyph page
    pub page_size: u32,
}

/// Asset store settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory relative asset names resolve against (empty = current dir)
    pub root: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            save_font_data: false,
            page_size: ATLAS_PAGE_SIZE,
            row_height_policy: RowHeightPolicy::Page,
            byte_order: ByteOrder::Little,
            max_fonts: MAX_FONTS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_FACE_GLYPHS,
            page_size: GLYPH_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. GLYPHBAKE_CONFIG environment variable
        if let Ok(path) = std::env::var("GLYPHBAKE_CONFIG") {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/glyphbake/config.toml
        default_config_path().filter(|p| p.exists())
    }

    /// Load configuration with priority:
    /// 1. GLYPHBAKE_CONFIG environment variable
    /// 2. ~/.config/glyphbake/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (what, size) in [
            ("atlas.page_size", self.atlas.page_size),
            ("cache.page_size", self.cache.page_size),
        ] {
            if !(4..=MAX_PAGE_SIZE).contains(&size) {
                anyhow::bail!("{} must be between 4 and {}, got {}", what, MAX_PAGE_SIZE, size);
            }
        }
        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be at least 1");
        }
        Ok(())
    }

    /// Write the built-in defaults to the user config path
    pub fn write_default_config() -> Result<PathBuf> {
        let path =
            default_config_path().ok_or_else(|| anyhow::anyhow!("Config directory not found"))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(&Self::default())?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Registry settings from the `[atlas]` section
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            max_fonts: self.atlas.max_fonts,
            page_size: self.atlas.page_size,
            row_height_policy: self.atlas.row_height_policy,
            byte_order: self.atlas.byte_order,
            save_font_data: self.atlas.save_font_data,
        }
    }

    /// Glyph cache from the `[cache]` section
    pub fn glyph_cache(&self) -> Result<GlyphCache> {
        Ok(GlyphCache::new(self.cache.capacity, self.cache.page_size)?)
    }

    /// Root directory for the asset store
    pub fn asset_root(&self) -> PathBuf {
        if self.assets.root.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(expand_home(&self.assets.root))
        }
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glyphbake").join("config.toml"))
}

/// Expand a leading `~/`
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}
