mod loader;
mod source;

pub use loader::load_sources;
pub use source::{SourceImage, SourceSet};
