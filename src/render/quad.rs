use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::{RenderError, TileRender};
use crate::scene::{TexRef, Tile};

/// Element indices for one quad, two triangles sharing the 0-2 diagonal
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// One corner of a tile quad as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TileVertex {
    /// Normalized device coordinates
    pub pos: [f32; 2],
    /// Texture coordinate in 1/128 units of the atlas
    pub tex: [u8; 2],
    pub padding: [u8; 2],
    pub color: [u8; 4],
}

/// Index buffer contents for `quads` consecutive quads
pub fn quad_indices(quads: usize) -> Vec<u16> {
    (0..quads)
        .flat_map(|q| {
            let base = u16::try_from(q * 4).unwrap_or(u16::MAX);
            QUAD_INDICES.map(|i| base.saturating_add(i))
        })
        .collect()
}

/// Turns tiles into screen-space quad vertices.
///
/// Pixel coordinates map to NDC with y pointing down and a half-pixel
/// offset so that integer positions land on pixel centres.
#[derive(Debug, Clone)]
pub struct QuadBuilder {
    scale: Vec2,
    offset: Vec2,
    max_tiles: usize,
    rects: Vec<[u8; 4]>,
    vertices: Vec<TileVertex>,
}

impl QuadBuilder {
    /// `rects` resolves [`TexRef::Slot`] ids, usually from a texture atlas
    pub fn new(screen_width: u32, screen_height: u32, max_tiles: usize, rects: Vec<[u8; 4]>) -> Self {
        let w = screen_width.max(1) as f32;
        let h = screen_height.max(1) as f32;
        Self {
            scale: Vec2::new(2.0 / w, -2.0 / h),
            offset: Vec2::new(-1.0 - 0.5 / w, 1.0 + 0.5 / h),
            max_tiles,
            rects,
            vertices: Vec::with_capacity(max_tiles * 4),
        }
    }

    pub fn max_tiles(&self) -> usize {
        self.max_tiles
    }

    /// Vertices produced by the last render
    pub fn vertices(&self) -> &[TileVertex] {
        &self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn resolve(&self, tex: TexRef) -> Result<[u8; 4], RenderError> {
        match tex {
            TexRef::Rect(rect) => Ok(rect),
            TexRef::Slot(id) => self
                .rects
                .get(usize::from(id))
                .copied()
                .ok_or(RenderError::UnknownSlot(id)),
        }
    }

    /// Four vertices for `tile`
    pub fn quad(&self, tile: &Tile) -> Result<[TileVertex; 4], RenderError> {
        let [x0, y0, x1, y1] = self.resolve(tile.tex)?;
        let origin = tile.translate * self.scale + self.offset;
        let edge_x = tile.transform.x_axis * self.scale;
        let edge_y = tile.transform.y_axis * self.scale;

        let corners = [
            (origin, [x0, y0]),
            (origin + edge_x, [x1, y0]),
            (origin + edge_x + edge_y, [x1, y1]),
            (origin + edge_y, [x0, y1]),
        ];
        Ok(corners.map(|(pos, tex)| TileVertex {
            pos: pos.to_array(),
            tex,
            padding: [0, 0],
            color: tile.color,
        }))
    }
}

impl TileRender for QuadBuilder {
    fn render_tiles(&mut self, tiles: &mut dyn Iterator<Item = Tile>) -> Result<usize, RenderError> {
        // Sized sequences are rejected before the previous frame is touched
        let (len, _) = tiles.size_hint();
        if len > self.max_tiles {
            return Err(RenderError::Overflow {
                len,
                capacity: self.max_tiles,
            });
        }

        self.vertices.clear();
        while let Some(tile) = tiles.next() {
            if self.quad_count() == self.max_tiles {
                let len = self.max_tiles + 1 + tiles.count();
                self.vertices.clear();
                return Err(RenderError::Overflow {
                    len,
                    capacity: self.max_tiles,
                });
            }
            match self.quad(&tile) {
                Ok(quad) => self.vertices.extend_from_slice(&quad),
                Err(e) => {
                    self.vertices.clear();
                    return Err(e);
                }
            }
        }
        Ok(self.quad_count())
    }
}
