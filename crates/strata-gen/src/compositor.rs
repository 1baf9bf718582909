//! Layer compositing
//!
//! Layers are pasted at the top-left corner of the base using their own
//! alpha as the paste mask. Every channel of the base, alpha included, is
//! mixed toward the layer by that mask. There is no scaling or centering;
//! the part of a layer that falls outside the base is dropped.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use strata_core::Result;

/// Save path used when the caller does not name one
pub const DEFAULT_RESULT_FILE: &str = "_res.png";

/// Paste `layer` onto `base` at (0, 0), in place
pub fn overlay_images(base: &mut RgbaImage, layer: &RgbaImage) {
    let width = base.width().min(layer.width());
    let height = base.height().min(layer.height());

    for y in 0..height {
        for x in 0..width {
            let src = layer.get_pixel(x, y);
            let mask = u32::from(src[3]);
            match mask {
                0 => {}
                255 => base.put_pixel(x, y, *src),
                _ => {
                    let dst = base.get_pixel_mut(x, y);
                    for c in 0..4 {
                        let mixed =
                            u32::from(src[c]) * mask + u32::from(dst[c]) * (255 - mask) + 127;
                        dst[c] = (mixed / 255) as u8;
                    }
                }
            }
        }
    }
}

/// Overlay the image at `layer_path` onto the image at `base_path`.
///
/// Both inputs are read as RGBA; the result is written to `save_path`
/// (or [`DEFAULT_RESULT_FILE`]) and that path is returned. `save_path` may
/// be the base itself.
pub fn overlay(base_path: &Path, layer_path: &Path, save_path: Option<&Path>) -> Result<PathBuf> {
    let mut base = image::open(base_path)?.to_rgba8();
    let layer = image::open(layer_path)?.to_rgba8();

    if layer.width() > base.width() || layer.height() > base.height() {
        tracing::warn!(
            "Layer {} ({}x{}) exceeds base ({}x{}); clipping",
            layer_path.display(),
            layer.width(),
            layer.height(),
            base.width(),
            base.height()
        );
    }

    overlay_images(&mut base, &layer);

    let output = save_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULT_FILE));
    base.save(&output)?;
    Ok(output)
}
