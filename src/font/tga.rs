//! Uncompressed 32-bit TGA for atlas pages
//!
//! Rows are written bottom to top (descriptor origin bit clear) and
//! pixels as BGRA. Reading goes through the `image` crate.

use image::io::Reader as ImageReader;
use image::ImageFormat;
use std::io::Cursor;

use crate::error::{FontError, Result};

const HEADER_LEN: usize = 18;

/// Encode an RGBA buffer (rows top to bottom)
pub fn encode_tga(rgba: &[u8], width: u16, height: u16) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut out = vec![0u8; HEADER_LEN];
    out[2] = 2; // uncompressed true-color
    out[12..14].copy_from_slice(&width.to_le_bytes());
    out[14..16].copy_from_slice(&height.to_le_bytes());
    out[16] = 32; // bits per pixel
    out[17] = 8; // alpha bits
    out.reserve(w * h * 4);

    for row in (0..h).rev() {
        let line = &rgba[row * w * 4..(row + 1) * w * 4];
        for px in line.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
    out
}

/// Decode a TGA into RGBA rows top to bottom, returning (rgba, width, height)
pub fn decode_tga(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(ImageFormat::Tga);
    let img = reader
        .decode()
        .map_err(|e| FontError::Corrupt(format!("TGA decode failed: {}", e)))?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    Ok((rgba.into_raw(), width, height))
}
