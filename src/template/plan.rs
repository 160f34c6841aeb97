//! Zero-mean template precomputation for normalized cross-correlation.

use crate::image::ImageView;
use crate::util::{GateMatchError, GateMatchResult};

/// Templates whose summed squared deviation falls below this are flat.
const MIN_SUM_SQ: f64 = 1e-6;

/// Zero-mean raster and normalization constant for one template resolution.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    sum_sq: f64,
    zero_mean: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> GateMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .filter(|&n| n > 0)
            .ok_or(GateMatchError::InvalidDimensions { width, height })?;

        let rows = || (0..height).filter_map(|y| tpl.row(y));
        let sum: f64 = rows().flatten().map(|&v| f64::from(v)).sum();
        let mean = sum / count as f64;

        let mut zero_mean = Vec::with_capacity(count);
        let mut sum_sq = 0.0f64;
        for &value in rows().flatten() {
            let centered = f64::from(value) - mean;
            sum_sq += centered * centered;
            zero_mean.push(centered as f32);
        }
        if zero_mean.len() != count {
            return Err(GateMatchError::BufferTooSmall {
                needed: count,
                got: zero_mean.len(),
            });
        }
        if sum_sq <= MIN_SUM_SQ {
            return Err(GateMatchError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            mean: mean as f32,
            sum_sq,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of template pixels `N`.
    pub fn len(&self) -> usize {
        self.zero_mean.len()
    }

    /// Always false for a successfully built plan.
    pub fn is_empty(&self) -> bool {
        self.zero_mean.is_empty()
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns `Σ(t − mean)²`, strictly positive.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }
}
