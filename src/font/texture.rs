//! Texture registry interface
//!
//! The renderer owns uploaded images. The font core only hands RGBA
//! buffers over and keeps the opaque handles it gets back.

use log::debug;
use std::collections::HashMap;

use crate::error::{FontError, Result};

/// Opaque handle of an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u32);

/// Opaque draw (shader) handle; 0 means "none"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawHandle(pub i32);

impl DrawHandle {
    pub const NONE: Self = Self(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Image upload and lookup, implemented by the renderer
pub trait TextureRegistry {
    /// Take ownership of an RGBA buffer and upload it
    fn register_image(
        &mut self,
        name: &str,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<ImageHandle>;

    /// Create a draw handle for an uploaded image
    fn register_draw_handle(&mut self, name: &str, image: ImageHandle) -> DrawHandle;

    /// Look up (or load) a draw handle by name; `DrawHandle::NONE` if unknown
    fn resolve_draw_handle(&mut self, name: &str) -> DrawHandle;

    /// Free an uploaded image
    fn release_image(&mut self, image: ImageHandle);
}

/// One image held by [`ImageLibrary`]
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// CPU-side texture registry
///
/// Keeps every registered image in memory. Used headless (baking,
/// previews) and as the renderer stand-in in tests.
#[derive(Debug, Default)]
pub struct ImageLibrary {
    images: HashMap<ImageHandle, StoredImage>,
    draw_handles: HashMap<String, DrawHandle>,
    next_image: u32,
    next_draw: i32,
}

impl ImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, image: ImageHandle) -> Option<&StoredImage> {
        self.images.get(&image)
    }

    /// Find a live image by name
    pub fn find(&self, name: &str) -> Option<(ImageHandle, &StoredImage)> {
        self.images
            .iter()
            .find(|(_, img)| img.name == name)
            .map(|(h, img)| (*h, img))
    }

    /// Live images sorted by handle (registration order)
    pub fn images(&self) -> Vec<(ImageHandle, &StoredImage)> {
        let mut all: Vec<_> = self.images.iter().map(|(h, img)| (*h, img)).collect();
        all.sort_by_key(|(h, _)| h.0);
        all
    }

    pub fn live_count(&self) -> usize {
        self.images.len()
    }

    /// Drop everything, as a renderer restart would
    pub fn purge(&mut self) {
        self.images.clear();
        self.draw_handles.clear();
    }
}

impl TextureRegistry for ImageLibrary {
    fn register_image(
        &mut self,
        name: &str,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Result<ImageHandle> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(FontError::Io(format!(
                "image {}: {} bytes, expected {}",
                name,
                rgba.len(),
                expected
            )));
        }
        self.next_image += 1;
        let handle = ImageHandle(self.next_image);
        self.images.insert(
            handle,
            StoredImage {
                name: name.to_string(),
                width,
                height,
                rgba,
            },
        );
        debug!("Image registered: {} {}x{} -> {:?}", name, width, height, handle);
        Ok(handle)
    }

    fn register_draw_handle(&mut self, name: &str, _image: ImageHandle) -> DrawHandle {
        if let Some(&h) = self.draw_handles.get(name) {
            return h;
        }
        self.next_draw += 1;
        let h = DrawHandle(self.next_draw);
        self.draw_handles.insert(name.to_string(), h);
        h
    }

    fn resolve_draw_handle(&mut self, name: &str) -> DrawHandle {
        if let Some(&h) = self.draw_handles.get(name) {
            return h;
        }
        // Names of images already uploaded resolve lazily, others are unknown
        match self.find(name).map(|(h, _)| h) {
            Some(image) => self.register_draw_handle(name, image),
            None => DrawHandle::NONE,
        }
    }

    fn release_image(&mut self, image: ImageHandle) {
        if let Some(img) = self.images.remove(&image) {
            self.draw_handles.remove(&img.name);
            debug!("Image released: {} ({:?})", img.name, image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_release() {
        let mut lib = ImageLibrary::new();
        let img = lib.register_image("page0", vec![0; 16], 2, 2).unwrap();
        let draw = lib.register_draw_handle("page0", img);
        assert!(!draw.is_none());
        assert_eq!(lib.resolve_draw_handle("page0"), draw);
        assert_eq!(lib.resolve_draw_handle("missing"), DrawHandle::NONE);

        lib.release_image(img);
        assert_eq!(lib.live_count(), 0);
        assert_eq!(lib.resolve_draw_handle("page0"), DrawHandle::NONE);
        // Releasing twice is harmless
        lib.release_image(img);
    }

    #[test]
    fn test_purge_forgets_everything() {
        let mut lib = ImageLibrary::new();
        let img = lib.register_image("page0", vec![0; 16], 2, 2).unwrap();
        lib.register_draw_handle("page0", img);
        lib.purge();
        assert_eq!(lib.live_count(), 0);
        assert!(lib.get(img).is_none());
        assert_eq!(lib.resolve_draw_handle("page0"), DrawHandle::NONE);
    }

    #[test]
    fn test_rejects_wrong_size() {
        let mut lib = ImageLibrary::new();
        assert!(lib.register_image("bad", vec![0; 3], 2, 2).is_err());
    }
}
