use std::path::PathBuf;
use thiserror::Error;

use crate::atlas::AtlasError;

#[derive(Error, Debug)]
pub enum TilebedError {
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("No valid images found in input")]
    NoImages,

    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to compress PNG '{path}': {message}")]
    PngCompress { path: PathBuf, message: String },

    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to build atlas '{name}': {source}")]
    AtlasBuild {
        name: String,
        #[source]
        source: AtlasError,
    },
}
