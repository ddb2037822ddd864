//! cache-export - cache extraction and mesh conversion tool
//!
//! Strips HTTP cache envelopes from cached downloads and converts cached
//! `.mesh` payloads (versions 1.00, 1.01, 2.00) to Wavefront OBJ.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mesh_common::ObjOptions;
use std::path::{Path, PathBuf};

use cache_export::{DEFAULT_CONFIG_FILE, ExtractConfig, StripOutcome, convert, envelope, scan};

#[derive(Parser)]
#[command(name = "cache-export")]
#[command(about = "Cache extraction and mesh conversion tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single mesh file to OBJ
    Mesh {
        /// Input .mesh file
        input: PathBuf,

        /// Output .obj file (must not exist)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reproduce the legacy converter's uv/normal output
        #[arg(long)]
        legacy: bool,
    },

    /// Strip the cache envelope from a single file
    Strip {
        /// Cached file
        input: PathBuf,

        /// Output payload file (must not exist)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract every usable entry from the cache directories
    Extract {
        /// Path to cache-export.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cache directory to scan (repeatable, overrides config)
        #[arg(short, long = "source")]
        sources: Vec<PathBuf>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip files smaller than this many bytes (overrides config)
        #[arg(long)]
        min_size: Option<u64>,

        /// Convert extracted meshes to .obj
        #[arg(long)]
        convert: bool,

        /// Reproduce the legacy converter's uv/normal output
        #[arg(long)]
        legacy: bool,
    },

    /// Validate a config without extracting
    Check {
        /// Path to cache-export.toml
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mesh {
            input,
            output,
            legacy,
        } => {
            let input = std::path::absolute(&input)
                .with_context(|| format!("Invalid input path: {:?}", input))?;
            let output = match output {
                Some(output) => std::path::absolute(&output)
                    .with_context(|| format!("Invalid output path: {:?}", output))?,
                None => input.with_extension("obj"),
            };
            let options = ObjOptions {
                strict_legacy_compat: legacy,
            };

            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert::convert_mesh_file(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Strip { input, output } => {
            match envelope::strip_file(&input, &output)? {
                StripOutcome::SkippedStatus(status) => {
                    anyhow::bail!("{:?} holds a failed response (status {})", input, status)
                }
                StripOutcome::Copied { bytes } => {
                    tracing::info!("No envelope, copied {} bytes to {:?}", bytes, output)
                }
                StripOutcome::Stripped { url, bytes, .. } => {
                    tracing::info!("Wrote {} bytes from {} to {:?}", bytes, url, output)
                }
            }
        }

        Commands::Extract {
            config,
            sources,
            output,
            min_size,
            convert,
            legacy,
        } => {
            let mut config = load_config(config.as_deref())?;

            if !sources.is_empty() {
                config.extract.sources = sources;
            }
            if let Some(output) = output {
                config.extract.output = output;
            }
            if let Some(min_size) = min_size {
                config.extract.min_size = min_size;
            }
            config.extract.convert_meshes |= convert;
            config.mesh.strict_legacy_compat |= legacy;

            config.validate()?;
            let summary = scan::extract_all(&config)?;
            tracing::info!("Extracted {} files", summary.stripped + summary.copied);
        }

        Commands::Check { config } => {
            tracing::info!("Checking config {:?}", config);
            let config = ExtractConfig::load(&config)?;
            config.validate()?;
            for source in &config.extract.sources {
                if !source.is_dir() {
                    tracing::warn!("Source is not a directory: {:?}", source);
                }
            }
            tracing::info!("Config is valid!");
        }
    }

    Ok(())
}

/// Explicit config, else `cache-export.toml` in the working directory, else defaults.
fn load_config(path: Option<&Path>) -> Result<ExtractConfig> {
    match path {
        Some(path) => ExtractConfig::load(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                ExtractConfig::load(default)
            } else {
                Ok(ExtractConfig::default())
            }
        }
    }
}
