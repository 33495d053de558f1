mod bsp;
mod rect;

pub use bsp::{MAX_PACK_EXTENT, PackError, PackPos, PackSize, occupancy, pack};
pub use rect::PackRect;
