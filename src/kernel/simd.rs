//! SIMD-accelerated numerator loop using the `wide` crate.
//!
//! The inner template row is processed 8 pixels at a time with `f32x8`; the
//! remainder of each row falls back to scalar code.

use crate::image::ImageView;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 u8 values and convert to f32x8.
#[inline]
fn load_u8x8_as_f32x8(slice: &[u8]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    for (lane, &value) in lanes.iter_mut().zip(&slice[..LANES]) {
        *lane = f32::from(value);
    }
    f32x8::from(lanes)
}

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(&slice[..LANES]);
    f32x8::from(lanes)
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}

/// SIMD normalized cross-correlation kernel.
pub struct NccSimd;

impl Kernel for NccSimd {
    fn correlate(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> Option<f32> {
        let tpl_width = plan.width();
        if x.checked_add(tpl_width)? > image.width() {
            return None;
        }
        let simd_end = tpl_width / LANES * LANES;

        let mut dot_vec = f32x8::ZERO;
        let mut dot_tail = 0.0f32;
        for (ty, tpl_row) in plan.zero_mean().chunks_exact(tpl_width).enumerate() {
            let img_row = &image.row(y.checked_add(ty)?)?[x..x + tpl_width];

            let mut tx = 0;
            while tx < simd_end {
                let img_vals = load_u8x8_as_f32x8(&img_row[tx..]);
                let tpl_vals = load_f32x8(&tpl_row[tx..]);
                dot_vec += tpl_vals * img_vals;
                tx += LANES;
            }
            for (&value, &t) in img_row[simd_end..].iter().zip(&tpl_row[simd_end..]) {
                dot_tail += f32::from(value) * t;
            }
        }

        Some(hsum(dot_vec) + dot_tail)
    }
}

#[cfg(test)]
mod tests {
    use super::NccSimd;
    use crate::image::{ImageView, OwnedImage};
    use crate::kernel::scalar::NccScalar;
    use crate::kernel::{IndexedImage, Kernel};
    use crate::template::TemplatePlan;

    #[test]
    fn simd_matches_scalar() {
        let (w, h) = (40, 30);
        let image: Vec<u8> = (0..w * h).map(|i| ((i * 31 + i / w * 7) % 256) as u8).collect();
        let indexed = IndexedImage::new(OwnedImage::new(image, w, h).unwrap());
        let tpl: Vec<u8> = (0..19 * 11).map(|i| ((i * 13 + 5) % 256) as u8).collect();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 19, 11).unwrap()).unwrap();

        for (x, y) in [(0, 0), (3, 7), (21, 19), (10, 4)] {
            let scalar = NccScalar::score_at(&indexed.level(), &plan, x, y);
            let simd = NccSimd::score_at(&indexed.level(), &plan, x, y);
            assert!((scalar - simd).abs() < 1e-4, "({x}, {y}): {scalar} vs {simd}");
        }
    }
}
