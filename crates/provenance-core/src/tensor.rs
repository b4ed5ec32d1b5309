// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Patch Tensor Conversion
// ─────────────────────────────────────────────────────────────────────
//! RGB patch to `[1, 3, S, S]` NCHW float tensor, pixels scaled to [0, 1].

use image::RgbImage;
use ndarray::Array4;

use provenance_types::Normalization;

/// Convert one patch to a single-item batch.
///
/// With `normalization`, each channel becomes `(v - mean[c]) / std[c]`
/// after scaling.
pub fn patch_to_tensor(patch: &RgbImage, normalization: Option<&Normalization>) -> Array4<f32> {
    let (w, h) = patch.dimensions();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        let v = f32::from(patch.get_pixel(x as u32, y as u32)[c]) / 255.0;
        match normalization {
            Some(norm) => (v - norm.mean[c]) / norm.std[c],
            None => v,
        }
    })
}
