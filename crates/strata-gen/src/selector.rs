//! Asset discovery and weighted selection
//!
//! A category directory is scanned once into an ordered candidate list.
//! Asset file names follow `<id>-<label>.png`; the id orders candidates and
//! the label is what ends up in an image's description. When the category
//! allows it, a "none" candidate is appended after the assets and takes the
//! last weight.

use crate::config::CategoryConfig;
use crate::recolor::is_derived;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use strata_core::{Result, StrataError};

/// A layer image with the metadata parsed from its file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Numeric prefix, if the file name has one
    pub id: Option<u32>,
    pub label: String,
    pub path: PathBuf,
}

impl Asset {
    /// Build a descriptor from a file path (`3-Bat Wings.png` -> id 3, label "Bat Wings")
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let (id, label) = match stem.split_once('-') {
            Some((prefix, rest)) => match prefix.trim().parse::<u32>() {
                Ok(id) => (Some(id), rest.to_string()),
                Err(_) => (None, stem.clone()),
            },
            None => (None, stem.clone()),
        };

        Self {
            id,
            label,
            path: path.to_path_buf(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} ({})", self.label, id),
            None => f.write_str(&self.label),
        }
    }
}

/// Outcome of a single draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Asset(Asset),
    Nothing,
}

impl Pick {
    pub fn asset(&self) -> Option<&Asset> {
        match self {
            Pick::Asset(a) => Some(a),
            Pick::Nothing => None,
        }
    }
}

pub(crate) fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// List the PNG assets at the top level of `dir`, skipping recolor
/// intermediates, ordered by id then file name.
pub fn list_assets(dir: &Path, marker: &str) -> Result<Vec<Asset>> {
    let mut assets = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_png(&path) && !is_derived(&path, marker) {
            assets.push(Asset::from_path(&path));
        }
    }

    assets.sort_by(|a, b| {
        a.id.unwrap_or(u32::MAX)
            .cmp(&b.id.unwrap_or(u32::MAX))
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });
    Ok(assets)
}

/// A scanned category, ready to draw from
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub dir: PathBuf,
    pub assets: Vec<Asset>,
    pub allow_none: bool,
    pub recolor: bool,
    pub background: bool,
    weights: Vec<u32>,
    distribution: WeightedIndex<u32>,
}

impl Category {
    /// Scan `dir` and pair its candidates with the configured weights
    pub fn scan(config: &CategoryConfig, dir: &Path, marker: &str) -> Result<Self> {
        let assets = list_assets(dir, marker)?;
        Self::from_assets(config, dir, assets)
    }

    pub fn from_assets(config: &CategoryConfig, dir: &Path, assets: Vec<Asset>) -> Result<Self> {
        let candidates = assets.len() + usize::from(config.allow_none);
        if candidates == 0 {
            return Err(StrataError::EmptyCategory(config.name.clone()));
        }
        if config.weights.len() != candidates {
            return Err(StrataError::WeightMismatch {
                category: config.name.clone(),
                candidates,
                weights: config.weights.len(),
            });
        }

        let distribution = WeightedIndex::new(&config.weights).map_err(|e| {
            let reason = match e {
                WeightedError::AllWeightsZero => "all weights are zero".to_string(),
                other => other.to_string(),
            };
            StrataError::InvalidWeights {
                category: config.name.clone(),
                reason,
            }
        })?;

        tracing::debug!(
            "Category '{}': {} assets in {}{}",
            config.name,
            assets.len(),
            dir.display(),
            if config.allow_none { " (+none)" } else { "" }
        );

        Ok(Self {
            name: config.name.clone(),
            dir: dir.to_path_buf(),
            assets,
            allow_none: config.allow_none,
            recolor: config.recolor,
            background: config.background,
            weights: config.weights.clone(),
            distribution,
        })
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Candidate at a draw index; the slot past the last asset is "none"
    pub fn candidate(&self, index: usize) -> Pick {
        match self.assets.get(index) {
            Some(asset) => Pick::Asset(asset.clone()),
            None => Pick::Nothing,
        }
    }

    /// One weighted draw over the candidates
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Pick {
        let index = self.distribution.sample(rng);
        let pick = self.candidate(index);
        match &pick {
            Pick::Asset(a) => tracing::debug!("{}: drew {}", self.name, a.file_name()),
            Pick::Nothing => tracing::debug!("{}: drew none", self.name),
        }
        pick
    }

    /// Each candidate's selection probability, in candidate order
    pub fn probabilities(&self) -> Vec<(Pick, f64)> {
        let total: u64 = self.weights.iter().map(|&w| u64::from(w)).sum();
        self.weights
            .iter()
            .enumerate()
            .map(|(i, &w)| (self.candidate(i), w as f64 / total as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strata_selector_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_asset_from_path() {
        let a = Asset::from_path(Path::new("wings/3-Bat Wings.png"));
        assert_eq!(a.id, Some(3));
        assert_eq!(a.label, "Bat Wings");

        let hyphenated = Asset::from_path(Path::new("hair/12-Long-Braid.png"));
        assert_eq!(hyphenated.id, Some(12));
        assert_eq!(hyphenated.label, "Long-Braid");

        let bare = Asset::from_path(Path::new("body/Plain.png"));
        assert_eq!(bare.id, None);
        assert_eq!(bare.label, "Plain");

        let odd = Asset::from_path(Path::new("body/x-Plain.png"));
        assert_eq!(odd.id, None);
        assert_eq!(odd.label, "x-Plain");
    }

    #[test]
    fn test_list_assets_filters_and_orders() {
        let dir = temp_dir();
        touch(
            &dir,
            &["10-Ten.png", "2-Two.png", "1-One.PNG", "1-One_.png", "notes.txt", "Loose.png"],
        );
        std::fs::create_dir_all(dir.join("nested.png")).unwrap();
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        touch(&dir.join("sub"), &["3-Deep.png"]);

        let labels: Vec<String> = list_assets(&dir, "_")
            .unwrap()
            .into_iter()
            .map(|a| a.label)
            .collect();
        assert_eq!(labels, ["One", "Two", "Ten", "Loose"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_weight_mismatch() {
        let dir = temp_dir();
        touch(&dir, &["1-A.png", "2-B.png"]);

        let config = CategoryConfig::new("hats", vec![1, 1]).with_none();
        match Category::scan(&config, &dir, "_") {
            Err(StrataError::WeightMismatch {
                candidates,
                weights,
                ..
            }) => {
                assert_eq!(candidates, 3);
                assert_eq!(weights, 2);
            }
            other => panic!("expected weight mismatch, got {:?}", other),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_and_zero_weights() {
        let dir = temp_dir();
        let empty = CategoryConfig::new("empty", vec![]);
        assert!(matches!(
            Category::scan(&empty, &dir, "_"),
            Err(StrataError::EmptyCategory(_))
        ));

        touch(&dir, &["1-A.png"]);
        let zeros = CategoryConfig::new("zeros", vec![0]);
        assert!(matches!(
            Category::scan(&zeros, &dir, "_"),
            Err(StrataError::InvalidWeights { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_single_nonzero_weight_always_wins() {
        let dir = temp_dir();
        touch(&dir, &["1-A.png", "2-B.png", "3-C.png"]);
        let config = CategoryConfig::new("letters", vec![0, 0, 1]);
        let category = Category::scan(&config, &dir, "_").unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(category.draw(&mut rng).asset().unwrap().label, "C");
        }

        let with_none = CategoryConfig::new("letters", vec![0, 0, 0, 1]).with_none();
        let category = Category::scan(&with_none, &dir, "_").unwrap();
        for _ in 0..200 {
            assert_eq!(category.draw(&mut rng), Pick::Nothing);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_draw_follows_weights() {
        let config = CategoryConfig::new("coin", vec![1, 9]);
        let assets = vec![
            Asset::from_path(Path::new("1-Rare.png")),
            Asset::from_path(Path::new("2-Common.png")),
        ];
        let category = Category::from_assets(&config, Path::new("."), assets).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let common = (0..10_000)
            .filter(|_| category.draw(&mut rng).asset().unwrap().label == "Common")
            .count();
        assert!((8_500..9_500).contains(&common), "common drawn {} times", common);
    }

    #[test]
    fn test_probabilities() {
        let config = CategoryConfig::new("hat", vec![1, 3]).with_none();
        let assets = vec![Asset::from_path(Path::new("1-Cap.png"))];
        let category = Category::from_assets(&config, Path::new("."), assets).unwrap();

        let probs = category.probabilities();
        assert_eq!(probs.len(), 2);
        assert!((probs[0].1 - 0.25).abs() < 1e-9);
        assert_eq!(probs[1].0, Pick::Nothing);
        assert!((probs[1].1 - 0.75).abs() < 1e-9);
    }
}
