//! Strata CLI - Command-line interface for the layered character generator

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{categories, clean, generate, init, palette, verify};
use std::path::Path;
use strata_gen::GeneratorConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Generate layered character images from weighted asset categories", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./strata.toml
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a batch of images
    Generate {
        /// Number of images (defaults to generation.count)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Asset root directory
        #[arg(long)]
        assets: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List each category's candidates with their weights
    Categories,

    /// Create a project with category directories and a default strata.toml
    Init {
        /// Project directory
        dir: String,
    },

    /// Delete recolor intermediates left in the category directories
    Clean,

    /// Print the most common colors of an image
    Palette {
        /// Path to a PNG image
        image: String,

        /// Number of colors to print
        #[arg(short = 'n', long, default_value = "4")]
        count: usize,
    },

    /// Check a batch's images against its manifest
    Verify {
        /// Directory holding manifest.toml (defaults to generation.output_dir)
        dir: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&str>) -> Result<GeneratorConfig> {
    let config = match path {
        Some(p) => GeneratorConfig::load_from_file(Path::new(p))?,
        None => GeneratorConfig::load()?,
    };
    tracing::debug!(
        "Config: {} categories, assets in {}",
        config.categories.len(),
        config.generation.asset_root.display()
    );
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { dir } => init::run(&dir),
        Commands::Palette { image, count } => palette::run(&image, count),
        Commands::Generate {
            count,
            seed,
            assets,
            output,
        } => generate::run(
            load_config(cli.config.as_deref())?,
            generate::GenerateArgs {
                count,
                seed,
                assets,
                output,
            },
        ),
        Commands::Categories => categories::run(&load_config(cli.config.as_deref())?),
        Commands::Clean => clean::run(&load_config(cli.config.as_deref())?),
        Commands::Verify { dir } => verify::run(&load_config(cli.config.as_deref())?, dir.as_deref()),
    }
}
