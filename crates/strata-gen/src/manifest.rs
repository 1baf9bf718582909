//! Batch manifest for tracking generated images
//!
//! Records every image of a batch with the seed that produced it, the
//! layers it is made of and a content hash, so a batch can be reproduced
//! and its files checked later.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{ContentHash, Result, StrataError};

pub const MANIFEST_FILE: &str = "manifest.toml";

/// A record of a single generated image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub number: u32,
    /// Image file name, relative to the manifest's directory
    pub image: String,
    pub description: String,
    #[serde(default)]
    pub background: Option<String>,
    /// Description labels in compositing order
    #[serde(default)]
    pub layers: Vec<String>,
    pub content_hash: String,
}

/// Manifest of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub generated_at: String,
    pub seed: u64,
    pub entries: Vec<ManifestEntry>,
}

/// TOML wrapper
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    manifest: BatchManifest,
}

impl BatchManifest {
    pub fn new(seed: u64) -> Self {
        Self {
            generated_at: now_iso8601(),
            seed,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ManifestFile = toml::from_str(&content).map_err(|e| {
            StrataError::Generation(format!("Failed to parse manifest: {}", e))
        })?;
        Ok(file.manifest)
    }

    /// Save manifest to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = ManifestFile {
            manifest: self.clone(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| {
            StrataError::Generation(format!("Failed to serialize manifest: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Re-hash every image under `dir` and return the numbers of entries
    /// whose file is missing or no longer matches
    pub fn verify(&self, dir: &Path) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| {
                let expected = ContentHash::from_prefixed_hex(&entry.content_hash);
                let actual = ContentHash::from_file(dir.join(&entry.image)).ok();
                expected.is_none() || expected != actual
            })
            .map(|entry| entry.number)
            .collect()
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`
fn now_iso8601() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format_unix_utc(secs)
}

fn format_unix_utc(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
