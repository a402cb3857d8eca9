//! Pre-baked font registry: build, dedup, persistence and page splitting

mod common;

use common::{assets_with_font, new_log, FakeRasterizer, FONT_PATH};
use glyphbake::assets::{AssetStore, MemoryAssetStore};
use glyphbake::constants::{FONT_FILE_SIZE, GLYPH_END, GLYPH_START};
use glyphbake::error::FontError;
use glyphbake::font::packer::RowHeightPolicy;
use glyphbake::font::{FontRegistry, ImageLibrary, RegistrySettings};

fn registry(settings: RegistrySettings) -> FontRegistry<FakeRasterizer> {
    FontRegistry::new(Some(FakeRasterizer::new(new_log())), settings)
}

fn renders(registry: &FontRegistry<FakeRasterizer>) -> usize {
    registry.rasterizer().map_or(0, |r| r.renders)
}

#[test]
fn test_builds_printable_range() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(font.name, "fonts/test_12.dat");
    assert_eq!(font.glyph_scale, 4.0);
    assert_eq!(renders(&reg), (GLYPH_END - GLYPH_START + 1) as usize);

    for cp in GLYPH_START..=GLYPH_END {
        let g = &font.glyphs[cp as usize];
        assert_eq!(g.height, 10);
        assert_eq!(g.top, 9);
        assert_eq!(g.bottom, -2);
        assert_eq!(g.pitch, 8);
        assert_eq!(g.advance_x, 9);
        assert!(g.s < g.s2 && g.s2 <= 1.0, "U+{:04X} s range", cp);
        assert!(g.t < g.t2 && g.t2 <= 1.0, "U+{:04X} t range", cp);
        assert!(!g.draw.is_none());
        assert_eq!(g.shader_name, "fonts/test_0_12.tga");
    }
    // Outside the baked range stays zero
    assert_eq!(font.glyphs[0x1F], Default::default());
    assert_eq!(font.glyphs[0x7F], Default::default());

    assert_eq!(textures.live_count(), 1);
    // Face closed after the build
    assert_eq!(reg.rasterizer().map(|r| r.open_faces), Some(0));
}

#[test]
fn test_first_glyphs_pack_left_to_right() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);

    let space = &font.glyphs[0x20];
    let bang = &font.glyphs[0x21];
    assert_eq!((space.s, space.t), (0.0, 0.0));
    assert_eq!(space.s2, 8.0 / 256.0);
    assert_eq!(space.t2, 10.0 / 256.0);
    assert_eq!(bang.s, 9.0 / 256.0);
    assert_eq!(bang.t, 0.0);
}

#[test]
fn test_failed_glyphs_stay_zero() {
    let mut rasterizer = FakeRasterizer::new(new_log());
    rasterizer.missing.insert('~' as u32);
    rasterizer.bitmap_only.insert('A' as u32);
    let mut reg = FontRegistry::new(Some(rasterizer), RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(font.glyphs['~' as usize], Default::default());
    assert_eq!(font.glyphs['A' as usize], Default::default());
    assert_eq!(font.glyphs['B' as usize].advance_x, 9);
}

#[test]
fn test_registration_is_deduplicated() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let first = reg.register_font(FONT_PATH, 16, &mut textures, &mut assets);
    let reads = assets.read_count();
    let built = renders(&reg);

    let again = reg.register_font("FONTS/TEST.TTF", 16, &mut textures, &mut assets);
    assert_eq!(again, first);
    assert_eq!(assets.read_count(), reads);
    assert_eq!(renders(&reg), built);
    assert_eq!(reg.len(), 1);
    assert_eq!(textures.live_count(), 1);
}

#[test]
fn test_point_size_clamped() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let zero = reg.register_font(FONT_PATH, 0, &mut textures, &mut assets);
    assert_eq!(zero.name, "fonts/test_12.dat");
    let negative = reg.register_font(FONT_PATH, -3, &mut textures, &mut assets);
    assert_eq!(negative, zero);
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_capacity_limit() {
    let settings = RegistrySettings {
        max_fonts: 2,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    assert!(!reg.register_font(FONT_PATH, 10, &mut textures, &mut assets).is_empty());
    assert!(!reg.register_font(FONT_PATH, 11, &mut textures, &mut assets).is_empty());

    let err = reg
        .try_register_font(FONT_PATH, 12, &mut textures, &mut assets)
        .unwrap_err();
    assert!(matches!(err, FontError::CapacityExceeded(_)));
    assert!(reg.register_font(FONT_PATH, 12, &mut textures, &mut assets).is_empty());

    // Existing fonts are still served
    assert_eq!(
        reg.register_font(FONT_PATH, 10, &mut textures, &mut assets).name,
        "fonts/test_10.dat"
    );
    assert_eq!(reg.len(), 2);
}

#[test]
fn test_empty_name_and_missing_file() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = MemoryAssetStore::new();

    assert!(matches!(
        reg.try_register_font("", 12, &mut textures, &mut assets),
        Err(FontError::NotFound(_))
    ));
    assert!(matches!(
        reg.try_register_font("fonts/none.ttf", 12, &mut textures, &mut assets),
        Err(FontError::Io(_))
    ));
    assert!(reg.is_empty());
}

#[test]
fn test_persist_and_reload_without_rasterizer() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings.clone());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let built = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    let dat = assets.get("fonts/test_12.dat").map(<[u8]>::len);
    assert_eq!(dat, Some(FONT_FILE_SIZE));
    let tga = assets.get("fonts/test_0_12.tga").map(<[u8]>::len);
    assert_eq!(tga, Some(18 + 256 * 256 * 4));

    // Same renderer, new process-level registry with no rasterizer
    let mut cached: FontRegistry<FakeRasterizer> = FontRegistry::new(None, settings.clone());
    let loaded = cached.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(loaded, built);

    // Fresh renderer: the saved page image is uploaded again
    let mut fresh = ImageLibrary::new();
    let mut cold: FontRegistry<FakeRasterizer> = FontRegistry::new(None, settings.clone());
    let loaded = cold.register_font(FONT_PATH, 12, &mut fresh, &mut assets);
    assert_eq!(loaded.glyphs[0x41].shader_name, "fonts/test_0_12.tga");
    assert!(!loaded.glyphs[0x41].draw.is_none());
    assert_eq!(loaded.glyphs[0x41].s2, built.glyphs[0x41].s2);
    assert_eq!(fresh.live_count(), 1);

    let (_, reloaded) = fresh.find("fonts/test_0_12.tga").unwrap();
    let (_, original) = textures.find("fonts/test_0_12.tga").unwrap();
    assert_eq!((reloaded.width, reloaded.height), (256, 256));
    assert!(reloaded.rgba == original.rgba);
}

#[test]
fn test_reload_without_page_image() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings.clone());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert!(assets.remove("fonts/test_0_12.tga").is_some());

    // Metrics still load; the page stays unbound
    let mut fresh = ImageLibrary::new();
    let mut cold: FontRegistry<FakeRasterizer> = FontRegistry::new(None, settings);
    let loaded = cold.register_font(FONT_PATH, 12, &mut fresh, &mut assets);
    assert_eq!(loaded.glyphs[0x41].advance_x, 9);
    assert!(loaded.glyphs[0x41].draw.is_none());
    assert_eq!(fresh.live_count(), 0);
}

#[test]
fn test_reload_rejects_corrupt_page_image() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings.clone());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assets.insert("fonts/test_0_12.tga", vec![1, 2, 3]);

    let mut fresh = ImageLibrary::new();
    let mut cold: FontRegistry<FakeRasterizer> = FontRegistry::new(None, settings);
    let loaded = cold.register_font(FONT_PATH, 12, &mut fresh, &mut assets);
    assert!(loaded.glyphs[0x41].draw.is_none());
    assert_eq!(fresh.live_count(), 0);
}

#[test]
fn test_rebind_after_renderer_restart() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);

    // Renderer dropped every image; the saved page comes back
    textures.purge();
    assert_eq!(textures.live_count(), 0);
    reg.rebind_images(&mut textures, &mut assets);
    assert!(!reg.fonts()[0].glyphs[0x41].draw.is_none());
    assert_eq!(textures.live_count(), 1);

    // Without the page image the handle is cleared
    let mut restarted = ImageLibrary::new();
    assets.remove("fonts/test_0_12.tga");
    reg.rebind_images(&mut restarted, &mut assets);
    assert!(reg.fonts()[0].glyphs[0x41].draw.is_none());
    assert_eq!(restarted.live_count(), 0);
}

#[test]
fn test_oversized_glyphs_never_rendered() {
    let mut rasterizer = FakeRasterizer::new(new_log());
    rasterizer.height = 20;
    let settings = RegistrySettings {
        page_size: 16,
        ..RegistrySettings::default()
    };
    let mut reg = FontRegistry::new(Some(rasterizer), settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(renders(&reg), 0);
    assert!(font.glyphs.iter().all(|g| *g == Default::default()));
    assert_eq!(textures.live_count(), 0);
}

#[test]
fn test_existing_files_not_overwritten() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    assets.insert("fonts/test_0_12.tga", vec![1, 2, 3]);

    reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(assets.get("fonts/test_0_12.tga"), Some(&[1u8, 2, 3][..]));
    assert!(assets.exists("fonts/test_12.dat"));
}

#[test]
fn test_corrupt_cache_is_rebuilt() {
    let mut reg = registry(RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    assets.insert("fonts/test_12.dat", vec![0; 100]);

    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(font.glyphs[0x41].advance_x, 9);
    assert!(renders(&reg) > 0);
}

#[test]
fn test_splits_across_pages() {
    // 64px pages hold 6 x 5 glyphs of 8x10
    let settings = RegistrySettings {
        page_size: 64,
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    assert_eq!(textures.live_count(), 4);
    for page in 0..4 {
        let name = format!("fonts/test_{}_12.tga", page);
        assert!(textures.find(&name).is_some(), "{} registered", name);
        assert!(assets.exists(&name), "{} saved", name);
    }

    let on_page = |page: usize| {
        let name = format!("fonts/test_{}_12.tga", page);
        font.glyphs.iter().filter(|g| g.shader_name == name).count()
    };
    assert_eq!([on_page(0), on_page(1), on_page(2), on_page(3)], [30, 30, 30, 5]);

    // First glyph of the second page restarts at the origin
    let g = &font.glyphs[(GLYPH_START + 30) as usize];
    assert_eq!(g.shader_name, "fonts/test_1_12.tga");
    assert_eq!((g.s, g.t), (0.0, 0.0));
    assert_ne!(g.draw, font.glyphs[GLYPH_START as usize].draw);
}

#[test]
fn test_row_policy_setting() {
    let settings = RegistrySettings {
        row_height_policy: RowHeightPolicy::Row,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings);
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    let font = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);
    // Uniform glyphs pack identically under both policies
    assert_eq!(font.glyphs[(GLYPH_START + 28) as usize].t, 11.0 / 256.0);
}

#[test]
fn test_legacy_name_loads_font_image() {
    let settings = RegistrySettings {
        save_font_data: true,
        ..RegistrySettings::default()
    };
    let mut reg = registry(settings.clone());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();
    let built = reg.register_font(FONT_PATH, 12, &mut textures, &mut assets);

    let bytes = assets.read_all("fonts/test_12.dat").unwrap();
    assets.insert("fonts/fontImage_12.dat", bytes);

    let mut legacy: FontRegistry<FakeRasterizer> = FontRegistry::new(None, settings);
    let font = legacy.register_font("fonts/oldfont", 12, &mut textures, &mut assets);
    assert_eq!(font.name, "fonts/fontImage_12.dat");
    assert_eq!(font.glyphs, built.glyphs);
}

#[test]
fn test_without_rasterizer_or_cache() {
    let mut reg: FontRegistry<FakeRasterizer> = FontRegistry::new(None, RegistrySettings::default());
    let mut textures = ImageLibrary::new();
    let mut assets = assets_with_font();

    assert!(matches!(
        reg.try_register_font(FONT_PATH, 12, &mut textures, &mut assets),
        Err(FontError::Init(_))
    ));
    assert!(reg.register_font(FONT_PATH, 12, &mut textures, &mut assets).is_empty());
    assert!(reg.is_empty());
}
