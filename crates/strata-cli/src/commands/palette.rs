//! Palette inspection command

use anyhow::Result;
use std::path::Path;
use strata_gen::most_common_colors_in_file;

pub fn run(image: &str, count: usize) -> Result<()> {
    let path = Path::new(image);
    if !path.exists() {
        anyhow::bail!("Image not found: {}", image);
    }

    let colors = most_common_colors_in_file(path, count)?;

    println!("{}: top {} color(s)", image, colors.len());
    for entry in &colors {
        println!("  {}  {:>8} px", entry.hex(), entry.count);
    }
    Ok(())
}
