use glam::{Mat2, Vec2};
use thiserror::Error;

use crate::pool::{PoolError, PoolIndex};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Failed to create pool: {0}")]
    Pool(#[from] PoolError),

    #[error("No free tile slots left")]
    Full,

    #[error("No free layer slots left")]
    LayersFull,

    #[error("Handle {0} is a sentinel or out of range")]
    InvalidHandle(PoolIndex),

    #[error("Handle {0} does not refer to a live entry")]
    NotInUse(PoolIndex),
}

/// Texture region a tile samples from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexRef {
    /// Explicit UV rectangle `[x0, y0, x1, y1]` in 1/128 units of the atlas
    Rect([u8; 4]),
    /// Slot id into an atlas rect table
    Slot(u16),
}

impl Default for TexRef {
    fn default() -> Self {
        TexRef::Slot(0)
    }
}

/// One renderable quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Columns are the quad's x and y edge vectors in pixels
    pub transform: Mat2,
    /// Position of the quad's first corner in pixels
    pub translate: Vec2,
    pub tex: TexRef,
    pub color: [u8; 4],
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            transform: Mat2::IDENTITY,
            translate: Vec2::ZERO,
            tex: TexRef::default(),
            color: [255, 255, 255, 255],
        }
    }
}

impl Tile {
    /// Axis-aligned sprite of `size` pixels at `pos`
    pub fn sprite(tex: TexRef, pos: Vec2, size: Vec2) -> Self {
        Self {
            transform: Mat2::from_diagonal(size),
            translate: pos,
            tex,
            ..Self::default()
        }
    }

    /// Rotate and scale a sprite of `size` pixels by `angle` radians
    pub fn set_rotation(&mut self, size: Vec2, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        self.transform = Mat2::from_cols(
            Vec2::new(cos, sin) * size.x,
            Vec2::new(-sin, cos) * size.y,
        );
    }

    /// Quad corners in winding order
    pub fn corners(&self) -> [Vec2; 4] {
        let x = self.transform.x_axis;
        let y = self.transform.y_axis;
        let p = self.translate;
        [p, p + x, p + x + y, p + y]
    }
}

/// Stable handle to a tile slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle(pub(crate) PoolIndex);

impl TileHandle {
    pub const fn from_raw(index: PoolIndex) -> Self {
        Self(index)
    }

    pub const fn raw(self) -> PoolIndex {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_corners() {
        let tile = Tile::sprite(TexRef::Slot(3), Vec2::new(10.0, 20.0), Vec2::new(8.0, 4.0));
        assert_eq!(
            tile.corners(),
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(18.0, 20.0),
                Vec2::new(18.0, 24.0),
                Vec2::new(10.0, 24.0),
            ]
        );
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let mut tile = Tile::default();
        tile.set_rotation(Vec2::new(2.0, 1.0), std::f32::consts::FRAC_PI_2);

        let [_, b, _, d] = tile.corners();
        assert!((b - Vec2::new(0.0, 2.0)).length() < 1e-5);
        assert!((d - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }
}
