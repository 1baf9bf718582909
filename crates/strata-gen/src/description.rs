//! Description files listing the layers of a finished image

use std::path::{Path, PathBuf};
use strata_core::Result;

pub const DESCRIPTION_EXTENSION: &str = "txt";

/// `7_res.png` -> `7_res.txt`
pub fn description_path(image_path: &Path) -> PathBuf {
    image_path.with_extension(DESCRIPTION_EXTENSION)
}

/// Write one label per line next to `image_path` and return the file's path
pub fn write_description(image_path: &Path, labels: &[String]) -> Result<PathBuf> {
    let path = description_path(image_path);
    let content: String = labels.iter().map(|label| format!("{}\n", label)).collect();
    std::fs::write(&path, content)?;
    Ok(path)
}

pub fn read_description(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}
