pub mod allocator;
pub mod atlas;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod packing;
pub mod pool;
pub mod render;
pub mod resource;
pub mod scene;
pub mod sprite;

pub use allocator::SimpleMemoryAllocator;
pub use atlas::{AtlasBuilder, TextureAtlas};
pub use error::TilebedError;
pub use packing::pack;
pub use pool::{CircleLinkedListPool, ObjRefPool};
pub use render::{QuadBuilder, TileRender, VertexBatches};
pub use scene::{Scene, Tile, TileSet};
