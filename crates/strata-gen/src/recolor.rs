//! Tolerance-based pixel recoloring
//!
//! A pixel "matches" a source color when its distance to it is within the
//! tolerance. Matching pixels take the target color shifted by the same
//! delta they had from the source, so shading inside a flat region survives
//! the remap. Alpha is never touched.
//!
//! Recolored layers are written next to their source as intermediates named
//! `<stem><marker>.<ext>`; the generator removes them after every image.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_core::{hex_to_rgb, Result, Rgb};

/// How the distance between a pixel and the source color is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMode {
    /// The red delta stands in for all three channels, both for the
    /// tolerance test and for the shift applied to the target.
    #[default]
    SingleChannel,
    /// Each channel is compared and shifted by its own delta.
    PerChannel,
}

/// What to do when a mapping names a color that is not valid hex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadColorPolicy {
    /// Return the color format error
    #[default]
    Fail,
    /// Leave the image alone and hand back the destination path unwritten
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecolorOptions {
    pub tolerance: u8,
    pub mode: ToleranceMode,
    pub bad_color: BadColorPolicy,
}

impl Default for RecolorOptions {
    fn default() -> Self {
        Self {
            tolerance: 10,
            mode: ToleranceMode::SingleChannel,
            bad_color: BadColorPolicy::Fail,
        }
    }
}

impl From<&crate::config::RecolorSettings> for RecolorOptions {
    fn from(settings: &crate::config::RecolorSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            mode: settings.tolerance_mode,
            bad_color: settings.bad_color,
        }
    }
}

/// Remap every pixel near `from` to `to`, in place.
///
/// Returns the number of pixels rewritten.
pub fn recolor_pixels(
    img: &mut RgbaImage,
    from: Rgb,
    to: Rgb,
    tolerance: u8,
    mode: ToleranceMode,
) -> usize {
    let tolerance = i32::from(tolerance);
    let mut changed = 0;

    for pixel in img.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let dr = i32::from(r) - i32::from(from.r);
        let (dg, db) = match mode {
            ToleranceMode::SingleChannel => (dr, dr),
            ToleranceMode::PerChannel => (
                i32::from(g) - i32::from(from.g),
                i32::from(b) - i32::from(from.b),
            ),
        };

        if dr.abs() <= tolerance && dg.abs() <= tolerance && db.abs() <= tolerance {
            let shifted = to.shifted(dr, dg, db);
            *pixel = Rgba([shifted.r, shifted.g, shifted.b, a]);
            changed += 1;
        }
    }

    changed
}

/// Apply one hex-to-hex mapping under the given options.
///
/// Returns `Ok(None)` when a bad color was skipped, otherwise the number of
/// pixels rewritten.
pub fn apply_hex_mapping(
    img: &mut RgbaImage,
    from_hex: &str,
    to_hex: &str,
    options: &RecolorOptions,
) -> Result<Option<usize>> {
    let colors = hex_to_rgb(from_hex).and_then(|from| Ok((from, hex_to_rgb(to_hex)?)));
    let (from, to) = match colors {
        Ok(pair) => pair,
        Err(e) => match options.bad_color {
            BadColorPolicy::Fail => return Err(e),
            BadColorPolicy::Skip => {
                tracing::warn!("Skipping recolor {} -> {}: {}", from_hex, to_hex, e);
                return Ok(None);
            }
        },
    };

    let changed = recolor_pixels(img, from, to, options.tolerance, options.mode);
    tracing::debug!("Recolored {} pixels {} -> {}", changed, from, to);
    Ok(Some(changed))
}

/// Path of the intermediate written for `path`: the marker goes between
/// stem and extension (`wings/3-Bat.png` -> `wings/3-Bat_.png`).
pub fn derived_path(path: &Path, marker: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, marker, ext.to_string_lossy()),
        None => format!("{}{}", stem, marker),
    };
    path.with_file_name(name)
}

/// Whether a file name belongs to a recolor intermediate
pub fn is_derived(path: &Path, marker: &str) -> bool {
    !marker.is_empty()
        && path
            .file_stem()
            .map(|s| s.to_string_lossy().ends_with(marker))
            .unwrap_or(false)
}

/// Apply a sequence of hex-to-hex mappings to an image file and write the
/// result to a derived path.
///
/// Mappings run in order on the same pixels, so a later mapping sees what
/// earlier ones wrote. The derived path is built from `save_to` when given,
/// else from `source`; the source file is never modified. When every
/// mapping was skipped under [`BadColorPolicy::Skip`] nothing is written and
/// the destination path itself is returned.
pub fn recolor_file<S: AsRef<str>>(
    source: &Path,
    mappings: &[(S, S)],
    save_to: Option<&Path>,
    marker: &str,
    options: &RecolorOptions,
) -> Result<PathBuf> {
    let destination = save_to.unwrap_or(source);
    let mut img = image::open(source)?.to_rgba8();

    let mut applied = 0;
    for (from, to) in mappings {
        if apply_hex_mapping(&mut img, from.as_ref(), to.as_ref(), options)?.is_some() {
            applied += 1;
        }
    }
    if applied == 0 {
        return Ok(destination.to_path_buf());
    }

    let output = derived_path(destination, marker);
    img.save(&output)?;
    Ok(output)
}

/// Delete recolor intermediates (PNG files whose stem ends with `marker`)
/// at the top level of `dir`. Returns how many were removed.
pub fn clear_derived_files(dir: &Path, marker: &str) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && crate::selector::is_png(&path) && is_derived(&path, marker) {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed intermediate {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::StrataError;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strata_recolor_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn test_solid_image_recolored_alpha_preserved() {
        let mut img = RgbaImage::from_fn(4, 4, |x, y| Rgba([200, 40, 40, (x * 60 + y) as u8]));
        let alphas: Vec<u8> = img.pixels().map(|p| p[3]).collect();

        let changed = recolor_pixels(
            &mut img,
            Rgb::new(200, 40, 40),
            Rgb::new(10, 120, 250),
            10,
            ToleranceMode::SingleChannel,
        );

        assert_eq!(changed, 16);
        for (pixel, alpha) in img.pixels().zip(alphas) {
            assert_eq!(pixel.0, [10, 120, 250, alpha]);
        }
    }

    #[test]
    fn test_delta_carried_to_target() {
        let mut img = solid(1, 1, [105, 50, 50, 255]);
        recolor_pixels(
            &mut img,
            Rgb::new(100, 50, 50),
            Rgb::new(20, 20, 20),
            10,
            ToleranceMode::SingleChannel,
        );
        // red delta of +5 is applied to every channel
        assert_eq!(img.get_pixel(0, 0).0, [25, 25, 25, 255]);
    }

    #[test]
    fn test_outside_tolerance_unchanged() {
        let mut img = solid(2, 1, [100, 0, 0, 255]);
        img.put_pixel(1, 0, Rgba([111, 0, 0, 255]));

        let changed = recolor_pixels(
            &mut img,
            Rgb::new(100, 0, 0),
            Rgb::new(0, 0, 255),
            10,
            ToleranceMode::SingleChannel,
        );

        assert_eq!(changed, 1);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [111, 0, 0, 255]);
    }

    #[test]
    fn test_single_channel_ignores_green_and_blue() {
        // Same red, very different green/blue: single-channel matches, per-channel does not
        let from = Rgb::new(50, 50, 50);
        let to = Rgb::new(200, 200, 200);

        let mut single = solid(1, 1, [50, 180, 0, 255]);
        assert_eq!(
            recolor_pixels(&mut single, from, to, 10, ToleranceMode::SingleChannel),
            1
        );
        assert_eq!(single.get_pixel(0, 0).0, [200, 200, 200, 255]);

        let mut per = solid(1, 1, [50, 180, 0, 255]);
        assert_eq!(
            recolor_pixels(&mut per, from, to, 10, ToleranceMode::PerChannel),
            0
        );
        assert_eq!(per.get_pixel(0, 0).0, [50, 180, 0, 255]);
    }

    #[test]
    fn test_per_channel_deltas_applied_separately() {
        let mut img = solid(1, 1, [52, 47, 59, 128]);
        recolor_pixels(
            &mut img,
            Rgb::new(50, 50, 50),
            Rgb::new(100, 250, 5),
            10,
            ToleranceMode::PerChannel,
        );
        assert_eq!(img.get_pixel(0, 0).0, [102, 247, 14, 128]);
    }

    #[test]
    fn test_shift_saturates() {
        let mut img = solid(1, 1, [60, 0, 0, 255]);
        recolor_pixels(
            &mut img,
            Rgb::new(55, 0, 0),
            Rgb::new(253, 0, 2),
            10,
            ToleranceMode::SingleChannel,
        );
        assert_eq!(img.get_pixel(0, 0).0, [255, 5, 7, 255]);
    }

    #[test]
    fn test_derived_path() {
        assert_eq!(
            derived_path(Path::new("wings/3-Bat.png"), "_"),
            PathBuf::from("wings/3-Bat_.png")
        );
        assert_eq!(
            derived_path(Path::new("wings/3-Bat_.png"), "_"),
            PathBuf::from("wings/3-Bat__.png")
        );
        assert_eq!(derived_path(Path::new("noext"), "~"), PathBuf::from("noext~"));
        assert!(is_derived(Path::new("wings/3-Bat_.png"), "_"));
        assert!(!is_derived(Path::new("wings/3-Red_Bat.png"), "_"));
    }

    #[test]
    fn test_recolor_file_leaves_source_untouched() {
        let dir = temp_dir();
        let source = dir.join("1-Cape.png");
        solid(3, 3, [10, 10, 10, 255]).save(&source).unwrap();
        let before = std::fs::read(&source).unwrap();

        let out = recolor_file(
            &source,
            &[("#0a0a0a", "#ff0000")],
            None,
            "_",
            &RecolorOptions::default(),
        )
        .unwrap();

        assert_eq!(out, dir.join("1-Cape_.png"));
        assert_eq!(std::fs::read(&source).unwrap(), before);
        let recolored = image::open(&out).unwrap().to_rgba8();
        assert!(recolored.pixels().all(|p| p.0 == [255, 0, 0, 255]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_recolor_file_bad_color_policies() {
        let dir = temp_dir();
        let source = dir.join("1-Cape.png");
        solid(2, 2, [10, 10, 10, 255]).save(&source).unwrap();

        let strict = RecolorOptions::default();
        let err = recolor_file(&source, &[("#0a0a0a", "not-a-color")], None, "_", &strict).unwrap_err();
        assert!(matches!(err, StrataError::ColorFormat(_)));

        let lenient = RecolorOptions {
            bad_color: BadColorPolicy::Skip,
            ..Default::default()
        };
        let save_to = dir.join("target.png");
        let out = recolor_file(
            &source,
            &[("#zz0000", "#ff0000")],
            Some(save_to.as_path()),
            "_",
            &lenient,
        )
        .unwrap();
        assert_eq!(out, save_to);
        assert!(!save_to.exists());
        assert!(!dir.join("target_.png").exists());

        // a skipped mapping does not stop the valid ones
        let out = recolor_file(
            &source,
            &[("#zz0000", "#ff0000"), ("#0a0a0a", "#00ff00")],
            None,
            "_",
            &lenient,
        )
        .unwrap();
        assert_eq!(out, dir.join("1-Cape_.png"));
        let recolored = image::open(&out).unwrap().to_rgba8();
        assert!(recolored.pixels().all(|p| p.0 == [0, 255, 0, 255]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_clear_derived_files() {
        let dir = temp_dir();
        for name in ["1-Bat.png", "1-Bat_.png", "1-Bat__.png", "2-Red_Bat.png", "notes_.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        assert_eq!(clear_derived_files(&dir, "_").unwrap(), 2);
        assert!(dir.join("1-Bat.png").exists());
        assert!(dir.join("2-Red_Bat.png").exists());
        assert!(dir.join("notes_.txt").exists());
        assert!(!dir.join("1-Bat_.png").exists());

        assert_eq!(clear_derived_files(&dir.join("missing"), "_").unwrap(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
