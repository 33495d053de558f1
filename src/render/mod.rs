mod batch;
mod quad;

pub use batch::{BatchId, VertexBatches};
pub use quad::{QUAD_INDICES, QuadBuilder, TileVertex, quad_indices};

use thiserror::Error;

use crate::allocator::AllocError;
use crate::pool::PoolError;
use crate::scene::Tile;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Renderer is busy")]
    Busy,

    #[error("Tile references unknown atlas slot {0}")]
    UnknownSlot(u16),

    #[error("Vertex buffer allocation failed: {0}")]
    Alloc(#[from] AllocError),

    #[error("Batch table error: {0}")]
    Pool(#[from] PoolError),

    #[error("Batch {0} is not reserved")]
    InvalidBatch(u16),

    #[error("{len} quads do not fit a batch of {capacity}")]
    Overflow { len: usize, capacity: usize },
}

/// Consumer of a frame's tiles.
///
/// Implementations consume the whole sequence and report how many tiles
/// they took. A frame larger than their capacity fails with `Overflow`.
pub trait TileRender {
    fn busy(&self) -> bool {
        false
    }

    fn render_tiles(&mut self, tiles: &mut dyn Iterator<Item = Tile>) -> Result<usize, RenderError>;
}
