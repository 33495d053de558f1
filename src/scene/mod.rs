mod layered;
mod tile;
mod tile_set;

pub use layered::{Layer, LayerHandle, Scene, SceneTileSequence};
pub use tile::{SceneError, TexRef, Tile, TileHandle};
pub use tile_set::{TileSequence, TileSet};
