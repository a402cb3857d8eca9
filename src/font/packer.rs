//! Atlas page packer
//!
//! Shelf packing into one square page: glyphs go left to right with a
//! 1px gap, rows advance by the tracked row height plus 1px. When a
//! glyph does not fit the packer reports [`Placement::PageFull`] and the
//! caller flushes the page and retries the same glyph on a fresh one.

use log::debug;
use serde::{Deserialize, Serialize};

use super::fixed::PixelMode;
use super::rasterizer::CoverageBitmap;
use crate::constants::MAX_PAGE_SIZE;
use crate::error::{FontError, Result};

/// How the height of a shelf is tracked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowHeightPolicy {
    /// One running maximum for the whole page (seeded by the measurement
    /// pass), so every row is as tall as the tallest glyph
    #[default]
    Page,
    /// Each row is as tall as its own tallest glyph
    Row,
}

/// Outcome of placing one glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Placed {
        x: i32,
        y: i32,
        s: f32,
        t: f32,
        s2: f32,
        t2: f32,
    },
    /// No room left on this page
    PageFull,
}

/// Packing cursor plus the page's 8-bit coverage buffer
#[derive(Debug, Clone)]
pub struct AtlasPacker {
    page_size: i32,
    policy: RowHeightPolicy,
    /// Shelf packing: current X position
    x: i32,
    /// Shelf packing: current Y position (top of row)
    y: i32,
    /// Shelf packing: tracked row height
    row_height: i32,
    /// Tallest glyph seen by the measurement pass
    measured_height: i32,
    /// Glyphs placed since the last reset
    placed: usize,
    /// Coverage buffer, page_size * page_size, rows top to bottom
    pixels: Vec<u8>,
}

impl AtlasPacker {
    pub fn new(page_size: u32, policy: RowHeightPolicy) -> Result<Self> {
        if page_size < 4 || page_size > MAX_PAGE_SIZE {
            return Err(FontError::CapacityExceeded(format!(
                "page size {} outside 4..={}",
                page_size, MAX_PAGE_SIZE
            )));
        }
        Ok(Self {
            page_size: page_size as i32,
            policy,
            x: 0,
            y: 0,
            row_height: 0,
            measured_height: 0,
            placed: 0,
            pixels: vec![0; (page_size * page_size) as usize],
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size as u32
    }

    /// Measurement pass: record a glyph height without placing it
    pub fn measure(&mut self, height: i32) {
        self.measured_height = self.measured_height.max(height);
    }

    pub fn measured_height(&self) -> i32 {
        self.measured_height
    }

    /// Current cursor (x, y)
    pub fn cursor(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn is_empty(&self) -> bool {
        self.placed == 0
    }

    /// Coverage bytes of the current page
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Clear the page and rewind the cursor. The measured height survives.
    pub fn reset(&mut self) {
        self.pixels.fill(0);
        self.x = 0;
        self.y = 0;
        self.row_height = 0;
        self.placed = 0;
    }

    /// Place a glyph and copy its coverage into the page
    pub fn place(&mut self, glyph: &CoverageBitmap) -> Placement {
        let w = glyph.box_width().max(0);
        let h = glyph.height.max(0);
        let limit = self.page_size - 1;

        let mut x = self.x;
        let mut y = self.y;
        let mut row_height = match self.policy {
            RowHeightPolicy::Page => self.row_height.max(self.measured_height).max(h),
            RowHeightPolicy::Row => self.row_height.max(h),
        };

        // Move to next row if doesn't fit in current row
        if x + w + 1 >= limit {
            if y + row_height + 1 >= limit {
                return Placement::PageFull;
            }
            if self.policy == RowHeightPolicy::Row {
                // The finished row does not include this glyph
                y += self.row_height + 1;
                row_height = h;
            } else {
                y += row_height + 1;
            }
            x = 0;
            if x + w + 1 >= limit {
                return Placement::PageFull;
            }
        }

        if y + row_height + 1 >= limit {
            return Placement::PageFull;
        }

        self.blit(glyph, x, y);

        let size = self.page_size as f32;
        let s = x as f32 / size;
        let t = y as f32 / size;
        let placement = Placement::Placed {
            x,
            y,
            s,
            t,
            s2: s + w as f32 / size,
            t2: t + h as f32 / size,
        };

        self.x = x + w + 1;
        self.y = y;
        self.row_height = row_height;
        self.placed += 1;
        placement
    }

    fn blit(&mut self, glyph: &CoverageBitmap, x: i32, y: i32) {
        let page = self.page_size as usize;
        let w = glyph.box_width().max(0) as usize;
        let x = x as usize;

        for row in 0..glyph.height.max(0) as usize {
            let start = (y as usize + row) * page + x;
            let dst = &mut self.pixels[start..start + w];
            let src = glyph.row(row);
            match glyph.mode {
                PixelMode::Gray => dst.copy_from_slice(&src[..w]),
                PixelMode::Mono => {
                    for (col, out) in dst.iter_mut().enumerate() {
                        if src[col >> 3] & (0x80 >> (col & 7)) != 0 {
                            *out = 0xff;
                        }
                    }
                }
            }
        }
        debug!("Blit {}x{} at ({}, {})", w, glyph.height, x, y);
    }
}
