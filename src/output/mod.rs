mod format;
mod json;

pub use format::{encode_atlas_png, save_atlas_image};
pub use json::write_json;
