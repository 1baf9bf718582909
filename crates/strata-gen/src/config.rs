//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `STRATA_SEED`, `STRATA_ASSET_ROOT`, `STRATA_OUTPUT_DIR`
//! 2. Project-local: `strata.toml`
//! 3. Global: `~/.strata/config.toml`
//!
//! Anything left unset falls back to the built-in character set: seven
//! categories from background to accessory with their stock weights.

use crate::recolor::{BadColorPolicy, ToleranceMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strata_core::{Result, StrataError};

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = "strata.toml";

/// One layer group: where its assets live and how they are drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Directory relative to the asset root
    pub dir: PathBuf,
    /// One weight per candidate, plus one for "none" when `allow_none` is set
    pub weights: Vec<u32>,
    #[serde(default)]
    pub allow_none: bool,
    #[serde(default)]
    pub recolor: bool,
    /// The background seeds the base image instead of being composited
    #[serde(default)]
    pub background: bool,
}

impl CategoryConfig {
    pub fn new(name: &str, weights: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            dir: PathBuf::from(name),
            weights,
            allow_none: false,
            recolor: false,
            background: false,
        }
    }

    pub fn with_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    pub fn with_recolor(mut self) -> Self {
        self.recolor = true;
        self
    }

    pub fn as_background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// Batch-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Number of images per batch
    pub count: u32,
    pub asset_root: PathBuf,
    pub output_dir: PathBuf,
    /// Working file name of the composite; finished images get their number prepended
    pub result_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Inserted before the extension of recolor intermediates
    pub derived_marker: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            count: 5,
            asset_root: PathBuf::from("assets"),
            output_dir: PathBuf::from("."),
            result_file: "_res.png".to_string(),
            seed: None,
            derived_marker: "_".to_string(),
        }
    }
}

/// Recolor step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecolorSettings {
    /// Dominant colors remapped per layer (the most common one is skipped)
    pub palette_size: usize,
    /// Offset used for the two analog shades of the main color
    pub color_step: i32,
    pub tolerance: u8,
    pub tolerance_mode: ToleranceMode,
    pub bad_color: BadColorPolicy,
}

impl Default for RecolorSettings {
    fn default() -> Self {
        Self {
            palette_size: 3,
            color_step: 30,
            tolerance: 10,
            tolerance_mode: ToleranceMode::SingleChannel,
            bad_color: BadColorPolicy::Fail,
        }
    }
}

/// Resolved generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub generation: GenerationSettings,
    pub recolor: RecolorSettings,
    #[serde(rename = "category")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            recolor: RecolorSettings::default(),
            categories: default_categories(),
        }
    }
}

/// The stock character set, in compositing order
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("background", vec![1, 1, 1, 1, 1, 1, 1]).as_background(),
        CategoryConfig::new("body", vec![1, 1, 8, 8, 8]),
        CategoryConfig::new("wings", vec![2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 10])
            .with_none()
            .with_recolor(),
        CategoryConfig::new("clothing", vec![3, 3, 5, 5, 4, 4, 1, 1, 4, 1]).with_recolor(),
        CategoryConfig::new("hair", vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1]).with_recolor(),
        CategoryConfig::new("weapon", vec![5, 5, 5, 5, 5, 2, 2, 2, 2, 2, 10])
            .with_none()
            .with_recolor(),
        CategoryConfig::new("accessory", vec![1, 1, 1, 1, 10]).with_none(),
    ]
}

/// Partial config as written on disk; every field optional so layers merge
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    generation: GenerationFile,
    #[serde(default)]
    recolor: RecolorFile,
    #[serde(default, rename = "category")]
    categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerationFile {
    count: Option<u32>,
    asset_root: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    result_file: Option<String>,
    seed: Option<u64>,
    derived_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RecolorFile {
    palette_size: Option<usize>,
    color_step: Option<i32>,
    tolerance: Option<u8>,
    tolerance_mode: Option<ToleranceMode>,
    bad_color: Option<BadColorPolicy>,
}

impl GeneratorConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Layer 1: Global config (~/.strata/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        // Layer 2: Project-local config (strata.toml)
        let local_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
        }

        // Layer 3: Environment variable overrides
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load config from a specific file path over the defaults, then apply env vars
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse a config document over the defaults, without env overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    /// Serialize to the on-disk TOML form
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Directory holding a category's assets
    pub fn category_dir(&self, category: &CategoryConfig) -> PathBuf {
        self.generation.asset_root.join(&category.dir)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Directories scanned for recolor intermediates after each image
    pub fn recolor_dirs(&self) -> Vec<PathBuf> {
        self.categories
            .iter()
            .filter(|c| c.recolor)
            .map(|c| self.category_dir(c))
            .collect()
    }

    /// Check structural rules that do not need the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(StrataError::Config("no categories configured".to_string()));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.name.as_str()) {
                return Err(StrataError::Config(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
            if category.weights.is_empty() {
                return Err(StrataError::Config(format!(
                    "category '{}' has no weights",
                    category.name
                )));
            }
            if category.background && category.allow_none {
                return Err(StrataError::Config(format!(
                    "background category '{}' cannot allow none",
                    category.name
                )));
            }
        }

        let backgrounds = self.categories.iter().filter(|c| c.background).count();
        if backgrounds > 1 {
            return Err(StrataError::Config(format!(
                "{} background categories configured, at most one allowed",
                backgrounds
            )));
        }

        // one random color plus its two analog shades
        if !(1..=3).contains(&self.recolor.palette_size) {
            return Err(StrataError::Config(format!(
                "recolor.palette_size must be between 1 and 3, got {}",
                self.recolor.palette_size
            )));
        }
        if let Some(seed) = self.generation.seed {
            if i64::try_from(seed).is_err() {
                return Err(StrataError::Config(format!(
                    "seed {} does not fit a TOML integer",
                    seed
                )));
            }
        }
        if self.generation.derived_marker.is_empty() {
            return Err(StrataError::Config(
                "generation.derived_marker must not be empty".to_string(),
            ));
        }
        if self.generation.result_file.is_empty() {
            return Err(StrataError::Config(
                "generation.result_file must not be empty".to_string(),
            ));
        }
        if self.generation.result_file.contains(|c| c == '/' || c == '\\') {
            return Err(StrataError::Config(format!(
                "generation.result_file '{}' must be a bare file name",
                self.generation.result_file
            )));
        }

        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".strata").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            StrataError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge(&mut self, overlay: ConfigFile) {
        let g = overlay.generation;
        if let Some(count) = g.count {
            self.generation.count = count;
        }
        if let Some(root) = g.asset_root {
            self.generation.asset_root = root;
        }
        if let Some(out) = g.output_dir {
            self.generation.output_dir = out;
        }
        if let Some(file) = g.result_file {
            self.generation.result_file = file;
        }
        if g.seed.is_some() {
            self.generation.seed = g.seed;
        }
        if let Some(marker) = g.derived_marker {
            self.generation.derived_marker = marker;
        }

        let r = overlay.recolor;
        if let Some(size) = r.palette_size {
            self.recolor.palette_size = size;
        }
        if let Some(step) = r.color_step {
            self.recolor.color_step = step;
        }
        if let Some(tolerance) = r.tolerance {
            self.recolor.tolerance = tolerance;
        }
        if let Some(mode) = r.tolerance_mode {
            self.recolor.tolerance_mode = mode;
        }
        if let Some(policy) = r.bad_color {
            self.recolor.bad_color = policy;
        }

        // A layer that lists categories replaces the whole set; order matters
        if !overlay.categories.is_empty() {
            self.categories = overlay.categories;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(seed) = std::env::var("STRATA_SEED") {
            let seed = seed.trim().parse::<u64>().map_err(|e| {
                StrataError::Config(format!("STRATA_SEED '{}' is not a u64: {}", seed, e))
            })?;
            self.generation.seed = Some(seed);
        }
        if let Ok(root) = std::env::var("STRATA_ASSET_ROOT") {
            self.generation.asset_root = PathBuf::from(root);
        }
        if let Ok(out) = std::env::var("STRATA_OUTPUT_DIR") {
            self.generation.output_dir = PathBuf::from(out);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strata_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("strata.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_match_stock_character_set() {
        let config = GeneratorConfig::default();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["background", "body", "wings", "clothing", "hair", "weapon", "accessory"]
        );
        assert!(config.categories[0].background);
        assert_eq!(config.generation.count, 5);
        assert_eq!(config.recolor.palette_size, 3);
        assert_eq!(config.recolor.color_step, 30);
        assert_eq!(config.recolor.tolerance, 10);

        let recolored: Vec<&str> = config
            .categories
            .iter()
            .filter(|c| c.recolor)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(recolored, ["wings", "clothing", "hair", "weapon"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
[generation]
count = 12
seed = 99

[recolor]
tolerance_mode = "per_channel"
bad_color = "skip"
"#,
        )
        .unwrap();

        assert_eq!(config.generation.count, 12);
        assert_eq!(config.generation.seed, Some(99));
        assert_eq!(config.generation.result_file, "_res.png");
        assert_eq!(config.recolor.tolerance_mode, ToleranceMode::PerChannel);
        assert_eq!(config.recolor.bad_color, BadColorPolicy::Skip);
        assert_eq!(config.recolor.tolerance, 10);
        assert_eq!(config.categories.len(), 7);
    }

    #[test]
    fn test_categories_replace_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
[[category]]
name = "sky"
dir = "bg"
weights = [1]
background = true

[[category]]
name = "hat"
dir = "hats"
weights = [0, 3, 1]
allow_none = true
recolor = true
"#,
        )
        .unwrap();

        assert_eq!(config.categories.len(), 2);
        let hat = config.category("hat").unwrap();
        assert!(hat.allow_none && hat.recolor && !hat.background);
        assert_eq!(
            config.category_dir(hat),
            PathBuf::from("assets").join("hats")
        );
        assert_eq!(config.recolor_dirs(), vec![PathBuf::from("assets").join("hats")]);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = GeneratorConfig::default();
        config.generation.seed = Some(42);
        let text = config.to_toml_string().unwrap();
        let parsed = GeneratorConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut two_backgrounds = GeneratorConfig::default();
        two_backgrounds.categories[1].background = true;
        assert!(two_backgrounds.validate().is_err());

        let mut none_background = GeneratorConfig::default();
        none_background.categories[0].allow_none = true;
        assert!(none_background.validate().is_err());

        let mut duplicate = GeneratorConfig::default();
        duplicate.categories[2].name = "body".to_string();
        assert!(duplicate.validate().is_err());

        let mut no_weights = GeneratorConfig::default();
        no_weights.categories[3].weights.clear();
        assert!(no_weights.validate().is_err());

        let mut empty_marker = GeneratorConfig::default();
        empty_marker.generation.derived_marker.clear();
        assert!(empty_marker.validate().is_err());

        let mut big_palette = GeneratorConfig::default();
        big_palette.recolor.palette_size = 4;
        assert!(big_palette.validate().is_err());

        let mut huge_seed = GeneratorConfig::default();
        huge_seed.generation.seed = Some(u64::MAX);
        assert!(huge_seed.validate().is_err());

        let mut nested_result = GeneratorConfig::default();
        nested_result.generation.result_file = "out/_res.png".to_string();
        assert!(nested_result.validate().is_err());

        let empty = GeneratorConfig {
            categories: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let path = temp_config("[generation]\ncount = \"many\"\n");
        let err = GeneratorConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("strata.toml"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_var_override() {
        let path = temp_config("[generation]\noutput_dir = \"from-file\"\n");

        std::env::set_var("STRATA_OUTPUT_DIR", "from-env");
        let config = GeneratorConfig::load_from_file(&path).unwrap();
        std::env::remove_var("STRATA_OUTPUT_DIR");

        assert_eq!(config.generation.output_dir, PathBuf::from("from-env"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }
}
