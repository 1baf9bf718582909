//! Image generation
//!
//! For every image the generator walks the categories in configured order:
//! draw a candidate, recolor it when the category asks for it, then paste it
//! onto the running composite. The background draw seeds the composite
//! instead of being pasted. Once all categories are done the composite is
//! renamed with the image number and its description file is written.
//!
//! Failures are not isolated per image: the first error aborts the batch and
//! leaves already finished images on disk.

use crate::compositor;
use crate::config::GeneratorConfig;
use crate::description::write_description;
use crate::manifest::{BatchManifest, ManifestEntry, MANIFEST_FILE};
use crate::palette::most_common_colors_in_file;
use crate::recolor::{clear_derived_files, recolor_file, RecolorOptions};
use crate::selector::{Asset, Category, Pick};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use strata_core::{hex_to_rgb, random_hex_color, rgb_to_hex, ContentHash, Result, StrataError};

/// A non-background layer that made it into an image
#[derive(Debug, Clone)]
pub struct LayerRecord {
    pub category: String,
    pub asset: Asset,
    /// Intermediate that was composited instead of the asset, if recolored
    pub recolored: Option<PathBuf>,
}

/// A finished image and its description file
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub number: u32,
    pub image_path: PathBuf,
    pub description_path: PathBuf,
    pub background: Option<Asset>,
    pub layers: Vec<LayerRecord>,
}

impl GeneratedImage {
    /// Description labels, in compositing order
    pub fn labels(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.asset.label.clone()).collect()
    }

    fn manifest_entry(&self) -> Result<ManifestEntry> {
        Ok(ManifestEntry {
            number: self.number,
            image: file_name(&self.image_path),
            description: file_name(&self.description_path),
            background: self.background.as_ref().map(|a| a.label.clone()),
            layers: self.labels(),
            content_hash: ContentHash::from_file(&self.image_path)?.to_prefixed_hex(),
        })
    }
}

/// Result of a batch run
#[derive(Debug)]
pub struct BatchResult {
    pub seed: u64,
    pub images: Vec<GeneratedImage>,
    pub manifest_path: PathBuf,
    pub temp_files_removed: usize,
}

/// Layered image generator over a scanned asset tree
pub struct Generator {
    config: GeneratorConfig,
    categories: Vec<Category>,
    rng: StdRng,
    seed: u64,
}

impl Generator {
    /// Validate the config and scan every category directory
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;

        let marker = &config.generation.derived_marker;
        let categories = config
            .categories
            .iter()
            .map(|c| Category::scan(c, &config.category_dir(c), marker))
            .collect::<Result<Vec<_>>>()?;

        let seed = config.generation.seed.unwrap_or_else(random_seed);
        tracing::info!(
            "Generator ready: {} categories, seed {}",
            categories.len(),
            seed
        );

        Ok(Self {
            config,
            categories,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Path of the composite while it is being built
    pub fn working_path(&self) -> PathBuf {
        self.config
            .generation
            .output_dir
            .join(&self.config.generation.result_file)
    }

    /// Final path of image `number` (`3` + `_res.png` -> `3_res.png`)
    pub fn numbered_path(&self, number: u32) -> PathBuf {
        self.config
            .generation
            .output_dir
            .join(format!("{}{}", number, self.config.generation.result_file))
    }

    /// Generate a single image and its description
    pub fn generate_image(&mut self, number: u32) -> Result<GeneratedImage> {
        std::fs::create_dir_all(&self.config.generation.output_dir)?;
        let working = self.working_path();
        let mut has_base = false;
        let mut background = None;
        let mut layers = Vec::new();

        for index in 0..self.categories.len() {
            let pick = self.categories[index].draw(&mut self.rng);
            let (name, is_background, recolor) = {
                let c = &self.categories[index];
                (c.name.clone(), c.background, c.recolor)
            };

            let asset = match pick {
                Pick::Nothing => continue,
                Pick::Asset(asset) => asset,
            };

            if is_background {
                std::fs::copy(&asset.path, &working)?;
                has_base = true;
                background = Some(asset);
                continue;
            }

            let recolored = if recolor {
                self.colorize_layer(&asset.path)?
            } else {
                None
            };
            let layer_path = recolored.as_deref().unwrap_or(&asset.path);

            if has_base {
                compositor::overlay(&working, layer_path, Some(working.as_path()))?;
            } else {
                // no background drawn yet; the first layer becomes the base
                std::fs::copy(layer_path, &working)?;
                has_base = true;
            }

            layers.push(LayerRecord {
                category: name,
                asset,
                recolored,
            });
        }

        if !has_base {
            return Err(StrataError::Generation(format!(
                "image {}: no background and every layer drew none",
                number
            )));
        }

        let image_path = self.numbered_path(number);
        std::fs::rename(&working, &image_path)?;

        let labels: Vec<String> = layers.iter().map(|l| l.asset.label.clone()).collect();
        let description_path = write_description(&image_path, &labels)?;

        tracing::info!(
            "Image {} -> {} ({} layers)",
            number,
            image_path.display(),
            layers.len()
        );

        Ok(GeneratedImage {
            number,
            image_path,
            description_path,
            background,
            layers,
        })
    }

    /// Generate images `1..=count`, cleaning intermediates after each one,
    /// and write the batch manifest
    pub fn run(&mut self, count: u32) -> Result<BatchResult> {
        let output_dir = self.config.generation.output_dir.clone();
        std::fs::create_dir_all(&output_dir)?;

        let mut manifest = BatchManifest::new(self.seed);
        let mut images = Vec::with_capacity(count as usize);
        let mut temp_files_removed = 0;

        for number in 1..=count {
            let image = self.generate_image(number)?;
            temp_files_removed += clear_temp_files(&self.config)?;
            manifest.add_entry(image.manifest_entry()?);
            images.push(image);
        }

        let manifest_path = output_dir.join(MANIFEST_FILE);
        manifest.save(&manifest_path)?;
        tracing::info!(
            "Batch done: {} images, seed {}, manifest {}",
            images.len(),
            self.seed,
            manifest_path.display()
        );

        Ok(BatchResult {
            seed: self.seed,
            images,
            manifest_path,
            temp_files_removed,
        })
    }

    /// Remap a layer's dominant colors to a fresh random color and two
    /// analog shades of it. Returns the intermediate's path, or `None` when
    /// the layer has nothing to remap besides its most common color.
    fn colorize_layer(&mut self, source: &Path) -> Result<Option<PathBuf>> {
        let palette_size = self.config.recolor.palette_size;

        // the most common color is the transparent surround; leave it be
        let targets: Vec<String> = most_common_colors_in_file(source, palette_size + 1)?
            .iter()
            .skip(1)
            .map(|entry| entry.hex())
            .collect();
        if targets.is_empty() {
            return Ok(None);
        }

        let main_hex = random_hex_color(&mut self.rng);
        let main = hex_to_rgb(&main_hex)?;
        let step = self.config.recolor.color_step;
        let shades = [
            main_hex,
            rgb_to_hex(i32::from(main.r) - step, main.g, main.b),
            rgb_to_hex(main.r, main.g, i32::from(main.b) + step),
        ];
        let mappings: Vec<(String, String)> = targets.into_iter().zip(shades).collect();

        let options = RecolorOptions::from(&self.config.recolor);
        let marker = &self.config.generation.derived_marker;
        let output = recolor_file(source, &mappings, None, marker, &options)?;
        if output.as_path() == source {
            // every mapping was skipped; composite the asset as is
            return Ok(None);
        }

        tracing::debug!("Recolored {} -> {}", source.display(), output.display());
        Ok(Some(output))
    }
}

/// Delete recolor intermediates from every recolorable category directory
pub fn clear_temp_files(config: &GeneratorConfig) -> Result<usize> {
    let marker = &config.generation.derived_marker;
    let mut removed = 0;
    for dir in config.recolor_dirs() {
        removed += clear_derived_files(&dir, marker)?;
    }
    Ok(removed)
}

/// A seed that still fits a TOML integer when written to the manifest
fn random_seed() -> u64 {
    rand::thread_rng().gen_range(0..=i64::MAX as u64)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
