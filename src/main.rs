//! glyphbake - bake font atlases from the command line
//!
//! Registers each font with a CPU-side texture registry, optionally
//! persists `.dat`/`.tga` assets, and can dump every registered page as
//! a PNG for inspection.

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use glyphbake::assets::DirAssetStore;
use glyphbake::config::{self, Config};
use glyphbake::constants::DEFAULT_POINT_SIZE;
use glyphbake::font::{FontRegistry, FontTable, FtRasterizer, ImageLibrary};

fn print_help() {
    println!(
        r#"glyphbake {} - glyph atlas builder

USAGE:
    glyphbake [OPTIONS] <FONT>...

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -v, --verbose           Log progress (RUST_LOG overrides)
    -s, --size <PT>         Point size, repeatable (default: 12, values <= 0 use 12)
    -r, --root <DIR>        Asset root (default: [assets] root or current dir)
    --save                  Write .dat and .tga files for newly built fonts
    --png <DIR>             Write every registered page as PNG into DIR
    --glyphs <TEXT>         Render TEXT through the glyph cache with the last font
    --init-config           Write the default config file

EXAMPLES:
    glyphbake fonts/veramono.ttf --size 12 --size 16 --save
    glyphbake fonts/unifont.ttf --glyphs "äöü€" --png /tmp/pages

CONFIG FILE:
    ~/.config/glyphbake/config.toml (or $GLYPHBAKE_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    fonts: Vec<String>,
    sizes: Vec<i32>,
    root: Option<PathBuf>,
    save: bool,
    png_dir: Option<PathBuf>,
    glyphs: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut opts = Options::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match arg.as_str() {
            "-s" | "--size" => {
                let v = value(arg.as_str())?;
                let size = v.parse::<i32>().with_context(|| format!("Invalid size: {}", v))?;
                opts.sizes.push(size);
            }
            "-r" | "--root" => opts.root = Some(PathBuf::from(value(arg.as_str())?)),
            "--png" => opts.png_dir = Some(PathBuf::from(value(arg.as_str())?)),
            "--glyphs" => opts.glyphs = Some(value(arg.as_str())?),
            "--save" => opts.save = true,
            "-v" | "--verbose" => {}
            a if a.starts_with('-') => return Err(anyhow!("Unknown option: {}", a)),
            font => opts.fonts.push(font.to_string()),
        }
    }
    if opts.sizes.is_empty() {
        opts.sizes.push(DEFAULT_POINT_SIZE);
    }
    Ok(opts)
}

/// Page images are named like asset paths; flatten them for the output dir
fn png_file_name(image_name: &str) -> String {
    let base = image_name.trim_start_matches('*').replace(['/', '\\'], "_");
    match base.strip_suffix(".tga") {
        Some(stem) => format!("{}.png", stem),
        None => format!("{}.png", base),
    }
}

fn save_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    Ok(())
}

fn print_summary(table: &FontTable) {
    let rendered = table.glyphs.iter().filter(|g| g.advance_x > 0).count();
    let mut pages: Vec<&str> = table
        .glyphs
        .iter()
        .map(|g| g.shader_name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    pages.sort_unstable();
    pages.dedup();
    println!(
        "{}: {} glyphs, scale {:.3}, {} page(s)",
        table.name,
        rendered,
        table.glyph_scale,
        pages.len()
    );
    for page in pages {
        println!("    {}", page);
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("glyphbake {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // --init-config
    if args.iter().any(|a| a == "--init-config") {
        if let Some(path) = config::default_config_path().filter(|p| p.exists()) {
            println!("Config file already exists: {}", path.display());
            return Ok(());
        }
        let path = Config::write_default_config()?;
        println!("Config file created: {}", path.display());
        return Ok(());
    }

    let opts = parse_args(&args)?;
    if opts.fonts.is_empty() {
        print_help();
        return Err(anyhow!("No font given"));
    }

    let config = Config::load();
    let mut settings = config.registry_settings();
    settings.save_font_data |= opts.save;

    let root = opts.root.clone().unwrap_or_else(|| config.asset_root());
    info!("Asset root: {}", root.display());
    let mut assets = DirAssetStore::new(root);
    let mut textures = ImageLibrary::new();
    let mut cache = config.glyph_cache()?;

    let rasterizer = match FtRasterizer::new() {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("{}; only cached font data can be loaded", e);
            None
        }
    };
    let mut registry = FontRegistry::new(rasterizer, settings);

    let mut last = None;
    for font in &opts.fonts {
        for &size in &opts.sizes {
            let table = registry
                .try_register_font(font, size, &mut textures, &mut assets)
                .with_context(|| format!("Failed to register {} at {}pt", font, size))?;
            print_summary(&table);
            last = Some((font.as_str(), size, table));
        }
    }

    if let (Some(text), Some((font, size, table))) = (opts.glyphs.as_deref(), last.as_ref()) {
        let mut face = registry
            .load_face(font, *size, &mut assets)
            .with_context(|| format!("Failed to open face {}", font))?;
        for ch in text.chars() {
            let glyph = cache.glyph(
                table,
                &mut face,
                registry.rasterizer_mut(),
                &mut textures,
                ch.encode_utf8(&mut [0u8; 4]),
            );
            println!(
                "U+{:04X} {:?}: {}x{} advance {} -> {}",
                ch as u32, ch, glyph.image_width, glyph.image_height, glyph.advance_x, glyph.shader_name
            );
        }

        // Dump while the cached glyph images are still alive
        if let Some(dir) = &opts.png_dir {
            write_pngs(&textures, dir)?;
        }
        registry.free_face(face, &mut cache, &mut textures);
    } else if let Some(dir) = &opts.png_dir {
        write_pngs(&textures, dir)?;
    }

    registry.shutdown(&mut cache, &mut textures);
    Ok(())
}

fn write_pngs(textures: &ImageLibrary, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for (_, image) in textures.images() {
        let path = dir.join(png_file_name(&image.name));
        save_png(&path, image.width, image.height, &image.rgba)?;
        info!("Page saved: {}", path.display());
    }
    Ok(())
}
