use std::path::PathBuf;

use crate::resource::{ResourceDataSet, ResourceId, fnv_hash};

/// Encoded image read from disk, not yet decoded
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Original file path
    pub path: PathBuf,
    /// Resource name, a relative path with forward slashes
    pub name: String,
    /// Encoded file contents
    pub data: Vec<u8>,
}

impl SourceImage {
    pub fn id(&self) -> ResourceId {
        fnv_hash(&self.name)
    }
}

/// Source images in atlas slot order
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub images: Vec<SourceImage>,
}

impl SourceSet {
    /// Order images by name so slot numbers are stable between runs
    pub fn new(mut images: Vec<SourceImage>) -> Self {
        images.sort_by(|a, b| a.name.cmp(&b.name));
        Self { images }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceImage> {
        self.images.iter()
    }
}

impl ResourceDataSet for SourceSet {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn data(&self, index: usize) -> Option<&[u8]> {
        self.images.get(index).map(|img| img.data.as_slice())
    }
}
