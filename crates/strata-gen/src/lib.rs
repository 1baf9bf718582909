//! Strata Gen - Layered character image generation
//!
//! Draws one asset per category with weighted randomness, recolors the
//! layers that ask for it by remapping their dominant colors, and pastes
//! everything onto a background. Each finished image gets a description
//! file listing its layers, and each batch a manifest with content hashes.

pub mod compositor;
pub mod config;
pub mod description;
pub mod generate;
pub mod manifest;
pub mod palette;
pub mod recolor;
pub mod selector;

pub use compositor::{overlay, overlay_images};
pub use config::{CategoryConfig, GeneratorConfig, PROJECT_CONFIG_FILE};
pub use generate::{clear_temp_files, BatchResult, GeneratedImage, Generator, LayerRecord};
pub use manifest::{BatchManifest, ManifestEntry, MANIFEST_FILE};
pub use palette::{most_common_colors, most_common_colors_in_file, PaletteEntry};
pub use recolor::{BadColorPolicy, RecolorOptions, ToleranceMode};
pub use selector::{list_assets, Asset, Category, Pick};
