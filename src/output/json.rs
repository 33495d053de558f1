use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::atlas::{TextureAtlas, UV_EXTENT};
use crate::error::TilebedError;
use crate::resource::ResourceId;
use crate::sprite::SourceSet;

#[derive(Serialize)]
struct JsonOutput {
    meta: Meta,
    image: String,
    size: Size,
    unit: u16,
    uv_extent: u8,
    sprites: Vec<JsonSprite>,
}

#[derive(Serialize)]
struct Meta {
    app: &'static str,
    version: &'static str,
    format: &'static str,
}

#[derive(Serialize)]
struct Size {
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct JsonSprite {
    name: String,
    id: ResourceId,
    slot: u16,
    uv: [u8; 4],
    frame: Frame,
}

#[derive(Serialize)]
struct Frame {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

fn build_output(atlas: &TextureAtlas, sources: &SourceSet, base_name: &str) -> JsonOutput {
    let sprites = sources
        .iter()
        .zip(0u16..)
        .filter_map(|(source, slot)| {
            let uv = atlas.rect(slot)?;
            let (x, y, w, h) = atlas.frame(slot)?;
            Some(JsonSprite {
                name: source.name.clone(),
                id: source.id(),
                slot,
                uv,
                frame: Frame { x, y, w, h },
            })
        })
        .collect();

    JsonOutput {
        meta: Meta {
            app: "tilebed",
            version: env!("CARGO_PKG_VERSION"),
            format: "rgba8888",
        },
        image: format!("{}.png", base_name),
        size: Size {
            w: atlas.width,
            h: atlas.height,
        },
        unit: atlas.unit_length,
        uv_extent: UV_EXTENT,
        sprites,
    }
}

/// Write the JSON UV table for an atlas built from `sources`
pub fn write_json(
    atlas: &TextureAtlas,
    sources: &SourceSet,
    output_dir: &Path,
    base_name: &str,
) -> Result<()> {
    let output = build_output(atlas, sources, base_name);

    let json_path = output_dir.join(format!("{}.json", base_name));
    let content = serde_json::to_string_pretty(&output)?;

    fs::write(&json_path, content).map_err(|e| TilebedError::OutputWrite {
        path: json_path,
        source: e,
    })?;

    Ok(())
}
