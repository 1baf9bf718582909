//! Dominant color extraction

use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use strata_core::{Result, Rgb};

/// A color and how many pixels carry it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: Rgb,
    pub count: usize,
}

impl PaletteEntry {
    pub fn hex(&self) -> String {
        self.color.to_hex()
    }
}

/// The `n` most frequent colors, most frequent first.
///
/// Alpha is ignored, so fully transparent pixels count toward their RGB
/// value. Ties keep the order in which colors were first met scanning row by
/// row.
pub fn most_common_colors(img: &RgbaImage, n: usize) -> Vec<PaletteEntry> {
    let mut index: HashMap<Rgb, usize> = HashMap::new();
    let mut entries: Vec<PaletteEntry> = Vec::new();

    for pixel in img.pixels() {
        let color = Rgb::new(pixel[0], pixel[1], pixel[2]);
        match index.get(&color) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(color, entries.len());
                entries.push(PaletteEntry { color, count: 1 });
            }
        }
    }

    // stable: equal counts stay in first-seen order
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(n);
    entries
}

pub fn most_common_colors_in_file(path: &Path, n: usize) -> Result<Vec<PaletteEntry>> {
    let img = image::open(path)?.to_rgba8();
    Ok(most_common_colors(&img, n))
}
