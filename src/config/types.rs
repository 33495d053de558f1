use serde::{Deserialize, Serialize};

use crate::cli::CompressionLevel;

/// PNG compression level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressConfig {
    /// Optimization level 0-6
    Level(u8),
    /// Maximum compression ("max")
    Max(String),
}

impl CompressConfig {
    pub fn level(&self) -> CompressionLevel {
        match self {
            CompressConfig::Level(n) => CompressionLevel::Level(*n),
            CompressConfig::Max(_) => CompressionLevel::Max,
        }
    }
}

/// Tilebed configuration file structure.
///
/// All paths in the config are relative to the config file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilebedConfig {
    /// Config file version (currently 1)
    pub version: u32,
    /// Input file paths or glob patterns
    pub input: Vec<String>,
    /// Output directory for atlas files
    pub output_dir: String,
    /// Base name for output files
    pub name: String,
    /// Pixel size of one grid cell
    pub unit_length: u16,
    /// Atlas width in cells
    pub grid_width: u8,
    /// Atlas height in cells
    pub grid_height: u8,
    /// PNG compression configuration (optional)
    pub compress: Option<CompressConfig>,
}

impl Default for TilebedConfig {
    fn default() -> Self {
        Self {
            version: 1,
            input: Vec::new(),
            output_dir: ".".to_string(),
            name: "atlas".to_string(),
            unit_length: 32,
            grid_width: 16,
            grid_height: 16,
            compress: None,
        }
    }
}
