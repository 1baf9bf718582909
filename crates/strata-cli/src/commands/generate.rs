//! Batch generation command

use anyhow::Result;
use std::path::PathBuf;
use strata_gen::{Generator, GeneratorConfig};

pub struct GenerateArgs {
    pub count: Option<u32>,
    pub seed: Option<u64>,
    pub assets: Option<String>,
    pub output: Option<String>,
}

pub fn run(mut config: GeneratorConfig, args: GenerateArgs) -> Result<()> {
    if let Some(seed) = args.seed {
        config.generation.seed = Some(seed);
    }
    if let Some(assets) = args.assets {
        config.generation.asset_root = PathBuf::from(assets);
    }
    if let Some(output) = args.output {
        config.generation.output_dir = PathBuf::from(output);
    }
    let count = args.count.unwrap_or(config.generation.count);
    if count == 0 {
        anyhow::bail!("Nothing to generate: count is 0");
    }

    let mut generator = Generator::new(config)?;
    println!(
        "Generating {} image(s) from {} (seed {})...",
        count,
        generator.config().generation.asset_root.display(),
        generator.seed()
    );

    let result = generator.run(count)?;

    for image in &result.images {
        let labels = image.labels();
        let background = image
            .background
            .as_ref()
            .map(|a| a.label.as_str())
            .unwrap_or("-");
        println!(
            "  {}  [{}] {}",
            image.image_path.display(),
            background,
            if labels.is_empty() {
                "(no layers)".to_string()
            } else {
                labels.join(", ")
            }
        );
    }

    println!();
    println!("Generated {} image(s)", result.images.len());
    println!("  Seed:     {}", result.seed);
    println!("  Manifest: {}", result.manifest_path.display());
    if result.temp_files_removed > 0 {
        println!("  Cleaned:  {} intermediate file(s)", result.temp_files_removed);
    }

    Ok(())
}
