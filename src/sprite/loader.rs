use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;

use super::{SourceImage, SourceSet};
use crate::error::TilebedError;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Image path with its base directory for computing relative names
struct ImagePath {
    path: PathBuf,
    base: Option<PathBuf>,
}

/// Read source images from input paths (files or directories)
///
/// Directory inputs are walked recursively and their images named by the
/// path relative to that directory. File inputs are named relative to
/// `base_dir` when given, or by file name otherwise. Files are read in
/// parallel; decoding is left to the atlas builder.
pub fn load_sources(inputs: &[impl AsRef<Path>], base_dir: Option<&Path>) -> Result<SourceSet> {
    let image_paths = collect_image_paths(inputs, base_dir)?;

    if image_paths.is_empty() {
        return Err(TilebedError::NoImages.into());
    }

    info!("Reading {} images...", image_paths.len());

    let images: Result<Vec<_>> = image_paths
        .par_iter()
        .map(|img_path| read_source(&img_path.path, img_path.base.as_deref()))
        .collect();

    Ok(SourceSet::new(images?))
}

fn collect_image_paths(inputs: &[impl AsRef<Path>], base_dir: Option<&Path>) -> Result<Vec<ImagePath>> {
    let mut paths = Vec::new();

    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(TilebedError::InputNotFound(path.to_path_buf()).into());
        }

        if path.is_file() {
            if is_supported_image(path) {
                paths.push(ImagePath {
                    path: path.to_path_buf(),
                    base: base_dir.map(Path::to_path_buf),
                });
            }
        } else if path.is_dir() {
            collect_from_directory(path, path, &mut paths)?;
        }
    }

    Ok(paths)
}

fn collect_from_directory(base: &Path, dir: &Path, paths: &mut Vec<ImagePath>) -> Result<()> {
    for entry in std::fs::read_dir(dir).context("Failed to read directory")? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && is_supported_image(&path) {
            paths.push(ImagePath {
                path,
                base: Some(base.to_path_buf()),
            });
        } else if path.is_dir() {
            collect_from_directory(base, &path, paths)?;
        }
    }

    Ok(())
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resource name of `path`: relative to `base` when possible, always with
/// forward slashes so ids are the same on every platform
fn resource_name(path: &Path, base: Option<&Path>) -> String {
    let relative = match base.and_then(|b| path.strip_prefix(b).ok()) {
        Some(rel) => rel,
        None => path.file_name().map(Path::new).unwrap_or(path),
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_source(path: &Path, base: Option<&Path>) -> Result<SourceImage> {
    let data = std::fs::read(path).map_err(|e| TilebedError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    let name = resource_name(path, base);
    debug!("Read {} ({} bytes)", name, data.len());

    Ok(SourceImage {
        path: path.to_path_buf(),
        name,
        data,
    })
}
