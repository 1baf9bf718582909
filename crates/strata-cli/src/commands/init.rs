//! Project initialization command

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use strata_gen::{GeneratorConfig, PROJECT_CONFIG_FILE};

const CONFIG_HEADER: &str = "\
# Strata project configuration
#
# Each [[category]] is one layer, composited in the order listed. Put its
# images in <asset_root>/<dir> named <id>-<label>.png. `weights` needs one
# entry per image, plus a last entry for \"none\" when allow_none is set.

";

pub fn run(dir: &str) -> Result<()> {
    let project_dir = Path::new(dir);
    let config_path = project_dir.join(PROJECT_CONFIG_FILE);

    if config_path.exists() {
        anyhow::bail!("'{}' already exists", config_path.display());
    }

    let mut config = GeneratorConfig::default();
    config.generation.asset_root = PathBuf::from("assets");
    config.generation.output_dir = PathBuf::from("output");

    for category in &config.categories {
        fs::create_dir_all(project_dir.join(config.category_dir(category)))?;
    }
    fs::create_dir_all(project_dir.join(&config.generation.output_dir))?;

    let content = format!("{}{}", CONFIG_HEADER, config.to_toml_string()?);
    fs::write(&config_path, content)?;

    println!("Created Strata project: {}", dir);
    println!();
    println!("Project structure:");
    println!("  {}/", dir);
    println!("  ├── {}", PROJECT_CONFIG_FILE);
    println!("  ├── assets/");
    for (i, category) in config.categories.iter().enumerate() {
        let branch = if i + 1 == config.categories.len() { "└──" } else { "├──" };
        println!(
            "  │   {} {}/  ({} weight(s))",
            branch,
            category.dir.display(),
            category.weights.len()
        );
    }
    println!("  └── output/");
    println!();
    println!("Next steps:");
    println!("  add images to each category directory and adjust the weights");
    println!("  cd {}", dir);
    println!("  strata categories");
    println!("  strata generate");

    Ok(())
}
