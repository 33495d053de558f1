use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::TilebedConfig;

/// A loaded configuration file with its associated directory.
///
/// Paths in the config are relative to the config file location,
/// so we need to track where the config was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed configuration
    pub config: TilebedConfig,
    /// The directory containing the config file
    pub config_dir: PathBuf,
}

impl LoadedConfig {
    /// Load a config file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, config_dir)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Parse config JSON as if it was read from `config_dir`.
    pub fn parse(content: &str, config_dir: PathBuf) -> Result<Self> {
        let config: TilebedConfig = serde_json::from_str(content)?;
        if config.version != 1 {
            anyhow::bail!("unsupported config version {}", config.version);
        }
        Ok(Self { config, config_dir })
    }

    /// Resolve input patterns to actual file paths.
    ///
    /// Glob patterns are expanded, and all paths are resolved relative
    /// to the config file directory.
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut results = Vec::new();

        for pattern in &self.config.input {
            if is_glob_pattern(pattern) {
                let full_pattern = self.config_dir.join(pattern);
                let pattern_str = full_pattern.to_string_lossy();

                let paths = glob::glob(&pattern_str)
                    .with_context(|| format!("invalid glob pattern: {}", pattern))?;

                for entry in paths {
                    let path =
                        entry.with_context(|| format!("failed to read glob entry: {}", pattern))?;
                    results.push(path);
                }
            } else {
                results.push(self.config_dir.join(pattern));
            }
        }

        Ok(results)
    }

    /// Resolve the output directory relative to the config file directory.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.config_dir.join(&self.config.output_dir)
    }
}

/// Check if a pattern contains glob characters.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CompressionLevel;

    #[test]
    fn test_is_glob_pattern() {
        assert!(is_glob_pattern("*.png"));
        assert!(is_glob_pattern("tiles/**/*.webp"));
        assert!(is_glob_pattern("tile[0-9].png"));
        assert!(!is_glob_pattern("tiles/grass.png"));
    }

    #[test]
    fn test_parse_fills_defaults() {
        let loaded = LoadedConfig::parse(
            r#"{ "input": ["tiles/grass.png"], "grid_width": 8, "compress": "max" }"#,
            PathBuf::from("/project"),
        )
        .unwrap();

        assert_eq!(loaded.config.grid_width, 8);
        assert_eq!(loaded.config.grid_height, 16);
        assert_eq!(loaded.config.unit_length, 32);
        assert_eq!(loaded.config.name, "atlas");
        assert_eq!(
            loaded.config.compress.as_ref().map(|c| c.level()),
            Some(CompressionLevel::Max)
        );
        assert_eq!(
            loaded.resolve_inputs().unwrap(),
            vec![PathBuf::from("/project/tiles/grass.png")]
        );
        assert_eq!(loaded.resolve_output_dir(), PathBuf::from("/project/."));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(LoadedConfig::parse(r#"{ "version": 2 }"#, PathBuf::new()).is_err());
        assert!(LoadedConfig::parse(r#"{ "grid_width": 300 }"#, PathBuf::new()).is_err());
        assert!(LoadedConfig::parse("not json", PathBuf::new()).is_err());
    }
}
