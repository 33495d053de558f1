use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::Result;
use image::ImageFormat;
use log::{debug, info};

use crate::atlas::TextureAtlas;
use crate::cli::CompressionLevel;
use crate::error::TilebedError;

/// Encode the atlas as PNG, running it through oxipng when `compress` is set
pub fn encode_atlas_png(atlas: &TextureAtlas, path: &Path, compress: Option<CompressionLevel>) -> Result<Vec<u8>> {
    let mut encoded = Cursor::new(Vec::new());
    atlas
        .image
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|e| TilebedError::ImageSave {
            path: path.to_path_buf(),
            source: e,
        })?;
    let encoded = encoded.into_inner();

    let Some(level) = compress else {
        return Ok(encoded);
    };
    let opts = match level {
        CompressionLevel::Level(n) => oxipng::Options::from_preset(n),
        CompressionLevel::Max => oxipng::Options::max_compression(),
    };
    let optimized = oxipng::optimize_from_memory(&encoded, &opts).map_err(|e| TilebedError::PngCompress {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!("oxipng {:?}: {} -> {} bytes", level, encoded.len(), optimized.len());
    Ok(optimized)
}

/// Write the atlas texture to `path`
pub fn save_atlas_image(atlas: &TextureAtlas, path: &Path, compress: Option<CompressionLevel>) -> Result<()> {
    let data = encode_atlas_png(atlas, path, compress)?;

    fs::write(path, &data).map_err(|e| TilebedError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(
        "Atlas texture {}x{} ({}px unit, {} slots), {} bytes",
        atlas.width,
        atlas.height,
        atlas.unit_length,
        atlas.slot_count(),
        data.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;

    fn atlas(width: u32, height: u32) -> TextureAtlas {
        TextureAtlas {
            width,
            height,
            unit_length: 4,
            image: RgbaImage::new(width, height),
            rects: vec![[0, 0, 128, 128]],
            cells: Vec::new(),
            occupancy: 1.0,
        }
    }

    #[test]
    fn test_encoded_png_keeps_atlas_size() {
        let atlas = atlas(8, 4);
        let data = encode_atlas_png(&atlas, Path::new("atlas.png"), None).unwrap();

        let decoded = image::load_from_memory_with_format(&data, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_compressed_png_decodes() {
        let atlas = atlas(16, 16);
        let data = encode_atlas_png(&atlas, Path::new("atlas.png"), Some(CompressionLevel::Level(2))).unwrap();

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }
}
