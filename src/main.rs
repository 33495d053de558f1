use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use tilebed::TilebedError;
use tilebed::atlas::{AtlasBuilder, ImageCrateDecoder};
use tilebed::cli::{CliArgs, Command, CompressionLevel, HashArgs, PackArgs};
use tilebed::config::LoadedConfig;
use tilebed::output::{save_atlas_image, write_json};
use tilebed::resource::fnv_hash;
use tilebed::sprite::load_sources;

#[allow(clippy::print_stderr)]
fn main() {
    if let Err(e) = run() {
        // Use eprintln instead of error! because logger may not be initialized
        // (e.g., config loading fails before logger init)
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliArgs::parse();

    match &cli.command {
        Command::Pack(args) => pack(args),
        Command::Hash(args) => {
            print_hashes(args);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[allow(clippy::print_stdout)]
fn print_hashes(args: &HashArgs) {
    for name in &args.names {
        println!("{:#010x}  {}", fnv_hash(name), name);
    }
}

fn pack(args: &PackArgs) -> Result<()> {
    // Load config if specified and merge with CLI args
    let merged = merge_config_with_args(args)?;

    init_logging(merged.verbose);
    info!("Tilebed atlas builder v{}", env!("CARGO_PKG_VERSION"));

    // Create output directory if it doesn't exist
    if !merged.output.exists() {
        fs::create_dir_all(&merged.output)?;
    }

    let sources = load_sources(&merged.input, merged.base_dir.as_deref())?;
    info!("Read {} images", sources.images.len());

    let atlas = AtlasBuilder::new(merged.unit_length, merged.grid_width, merged.grid_height)
        .build(&sources, &ImageCrateDecoder)
        .map_err(|source| TilebedError::AtlasBuild {
            name: merged.name.clone(),
            source,
        })?;

    let path = merged.output.join(format!("{}.png", merged.name));
    save_atlas_image(&atlas, &path, merged.compress)?;
    info!("Saved {}", path.display());

    write_json(&atlas, &sources, &merged.output, &merged.name)?;
    info!("Generated {}.json", merged.name);

    info!("Done!");

    Ok(())
}

/// Merged configuration from CLI args and optional config file.
struct MergedConfig {
    input: Vec<PathBuf>,
    /// Directory that config-relative inputs are named against
    base_dir: Option<PathBuf>,
    output: PathBuf,
    name: String,
    unit_length: u16,
    grid_width: u8,
    grid_height: u8,
    verbose: bool,
    compress: Option<CompressionLevel>,
}

/// Merge config file values with CLI arguments.
/// CLI arguments always take precedence over config values.
fn merge_config_with_args(args: &PackArgs) -> Result<MergedConfig> {
    let loaded_config = if let Some(config_path) = &args.config {
        Some(
            LoadedConfig::load(config_path)
                .with_context(|| format!("failed to load config: {}", config_path.display()))?,
        )
    } else {
        None
    };

    // Determine input files: CLI args override config
    let (input, base_dir) = if !args.input.is_empty() {
        (args.input.clone(), None)
    } else if let Some(ref lc) = loaded_config {
        let inputs = lc
            .resolve_inputs()
            .context("failed to resolve input files from config")?;
        (inputs, Some(lc.config_dir.clone()))
    } else {
        // This shouldn't happen due to clap's required_unless_present
        (Vec::new(), None)
    };

    // Determine output directory: CLI > config > default
    let output = args.output.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.resolve_output_dir())
            .unwrap_or_else(|| PathBuf::from("."))
    });

    // Determine name: CLI > config > default
    let name = args.name.clone().unwrap_or_else(|| {
        loaded_config
            .as_ref()
            .map(|lc| lc.config.name.clone())
            .unwrap_or_else(|| "atlas".to_string())
    });

    // For numeric fields: CLI > config > default
    let defaults = tilebed::config::TilebedConfig::default();
    let config = loaded_config.as_ref().map(|lc| &lc.config);

    let unit_length = args
        .unit
        .or_else(|| config.map(|c| c.unit_length))
        .unwrap_or(defaults.unit_length);

    let grid_width = args
        .grid_width
        .or_else(|| config.map(|c| c.grid_width))
        .unwrap_or(defaults.grid_width);

    let grid_height = args
        .grid_height
        .or_else(|| config.map(|c| c.grid_height))
        .unwrap_or(defaults.grid_height);

    // Compress: CLI option overrides config
    let compress = if args.compress.is_some() {
        args.compress
    } else {
        config.and_then(|c| c.compress.as_ref()).map(|c| c.level())
    };

    Ok(MergedConfig {
        input,
        base_dir,
        output,
        name,
        unit_length,
        grid_width,
        grid_height,
        // Verbose is CLI-only
        verbose: args.verbose,
        compress,
    })
}
