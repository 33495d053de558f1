use image::RgbaImage;

use crate::packing::PackRect;

/// Texture coordinates span `0..=UV_EXTENT` across the atlas
pub const UV_EXTENT: u8 = 128;

/// A completed texture atlas
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    /// Atlas width in pixels
    pub width: u32,
    /// Atlas height in pixels
    pub height: u32,
    /// Pixel size of one grid cell
    pub unit_length: u16,
    /// Rendered atlas image
    pub image: RgbaImage,
    /// UV rect `[x0, y0, x1, y1]` per slot, in 1/128 units
    pub rects: Vec<[u8; 4]>,
    /// Placement of each slot in grid cells
    pub cells: Vec<PackRect>,
    /// Fraction of grid cells in use
    pub occupancy: f64,
}

impl TextureAtlas {
    pub fn slot_count(&self) -> usize {
        self.rects.len()
    }

    pub fn rect(&self, slot: u16) -> Option<[u8; 4]> {
        self.rects.get(usize::from(slot)).copied()
    }

    /// Pixel frame `(x, y, w, h)` of a slot
    pub fn frame(&self, slot: u16) -> Option<(u32, u32, u32, u32)> {
        let cell = self.cells.get(usize::from(slot))?;
        let unit = u32::from(self.unit_length);
        Some((
            u32::from(cell.x) * unit,
            u32::from(cell.y) * unit,
            u32::from(cell.width) * unit,
            u32::from(cell.height) * unit,
        ))
    }
}
