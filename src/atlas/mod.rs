mod builder;
mod decoder;
mod types;

pub use builder::{AtlasBuilder, AtlasError};
pub use decoder::{DecodeError, ImageCrateDecoder, ImageDecoder};
pub use types::{TextureAtlas, UV_EXTENT};
