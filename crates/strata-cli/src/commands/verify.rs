//! Manifest verification command

use anyhow::Result;
use std::path::PathBuf;
use strata_gen::{BatchManifest, GeneratorConfig, MANIFEST_FILE};

pub fn run(config: &GeneratorConfig, dir: Option<&str>) -> Result<()> {
    let dir = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.generation.output_dir.clone());
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        anyhow::bail!("No manifest at {}", manifest_path.display());
    }

    let manifest = BatchManifest::load(&manifest_path)?;
    let bad = manifest.verify(&dir);

    println!(
        "Batch of {} image(s), seed {}, generated {}",
        manifest.entries.len(),
        manifest.seed,
        manifest.generated_at
    );
    for entry in manifest.entries.iter().filter(|e| bad.contains(&e.number)) {
        println!("  ! {} is missing or modified", entry.image);
    }

    if !bad.is_empty() {
        anyhow::bail!("{} image(s) failed verification", bad.len());
    }
    println!("All images match their recorded hashes");
    Ok(())
}
