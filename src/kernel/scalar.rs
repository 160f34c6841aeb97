//! Scalar reference kernel.

use crate::image::ImageView;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;

/// Scalar normalized cross-correlation kernel.
pub struct NccScalar;

impl Kernel for NccScalar {
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
        let mut dot = 0.0f32;
        for (ty, tpl_row) in plan.zero_mean().chunks_exact(tpl_width).enumerate() {
            let img_row = image.row(y.checked_add(ty)?)?;
            dot += img_row[x..x + tpl_width]
                .iter()
                .zip(tpl_row)
                .map(|(&value, &t)| f32::from(value) * t)
                .sum::<f32>();
        }
        Some(dot)
    }
}
