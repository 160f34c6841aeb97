//! Normalized cross-correlation kernels.
//!
//! For a window with top-left `(x, y)` and a template of `N` pixels:
//!
//! ```text
//! numerator   = Σ image[x + i, y + j] · zero_mean[i, j]
//! denominator = sqrt((Σf² − (Σf)² / N) · Σ(t − mean)²)
//! score       = numerator / denominator
//! ```
//!
//! `Σf` and `Σf²` come from the summation table in O(1); only the numerator
//! needs a per-pixel loop, which is what `Kernel::correlate` implements. A
//! zero, `NaN` or infinite denominator scores `NO_MATCH`.

use crate::image::integral::SummationTable;
use crate::image::{ImageView, OwnedImage};
use crate::template::TemplatePlan;
use crate::trace::trace_debug;
use crate::util::{GateMatchError, GateMatchResult};

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

/// Score assigned to windows that cannot be correlated.
pub const NO_MATCH: f32 = -1.0;

/// A raster paired with its summation table.
#[derive(Clone, Copy)]
pub struct ScoringLevel<'a> {
    image: ImageView<'a, u8>,
    table: &'a SummationTable,
}

impl<'a> ScoringLevel<'a> {
    /// Pairs `image` with a table built from it.
    pub fn new(image: ImageView<'a, u8>, table: &'a SummationTable) -> GateMatchResult<Self> {
        if image.width() != table.width() || image.height() != table.height() {
            return Err(GateMatchError::InvalidDimensions {
                width: table.width(),
                height: table.height(),
            });
        }
        Ok(Self { image, table })
    }

    pub fn image(&self) -> ImageView<'a, u8> {
        self.image
    }

    pub fn table(&self) -> &'a SummationTable {
        self.table
    }

    /// Largest valid top-left corner for a `width × height` window.
    pub fn max_position(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let max_x = self.image.width().checked_sub(width)?;
        let max_y = self.image.height().checked_sub(height)?;
        Some((max_x, max_y))
    }
}

/// Owned raster plus summation table, built once per resolution per run.
#[derive(Clone, Debug)]
pub struct IndexedImage {
    image: OwnedImage,
    table: SummationTable,
}

impl IndexedImage {
    pub fn new(image: OwnedImage) -> Self {
        let table = SummationTable::build(image.view());
        Self { image, table }
    }

    /// Borrows the raster and table as a scoring level.
    pub fn level(&self) -> ScoringLevel<'_> {
        ScoringLevel {
            image: self.image.view(),
            table: &self.table,
        }
    }
}

/// Correlation kernel: the numerator loop plus the shared normalization.
pub trait Kernel {
    /// Computes `Σ image · zero_mean` for the window at `(x, y)`.
    ///
    /// Returns `None` when the window leaves the image.
    fn correlate(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize)
        -> Option<f32>;

    /// Normalized cross-correlation at `(x, y)`, nominally in `[-1, 1]`.
    fn score_at(level: &ScoringLevel<'_>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
        let Some((sum, sum_sq)) = level.table.window_stats(x, y, plan.width(), plan.height())
        else {
            return NO_MATCH;
        };
        let Some(dot) = Self::correlate(level.image, plan, x, y) else {
            return NO_MATCH;
        };
        normalize(f64::from(dot), sum, sum_sq, plan).unwrap_or_else(|| {
            trace_debug!("degenerate_window", x = x, y = y);
            NO_MATCH
        })
    }
}

fn normalize(dot: f64, sum: f64, sum_sq: f64, plan: &TemplatePlan) -> Option<f32> {
    let n = plan.len() as f64;
    let window_var = sum_sq - sum * sum / n;
    let denom = (window_var * plan.sum_sq()).sqrt();
    if !denom.is_finite() || denom <= 0.0 {
        return None;
    }
    let score = (dot / denom) as f32;
    score.is_finite().then_some(score)
}

/// Kernel used by the matcher: SIMD when the `simd` feature is enabled.
#[cfg(not(feature = "simd"))]
pub type NccKernel = scalar::NccScalar;
#[cfg(feature = "simd")]
pub type NccKernel = simd::NccSimd;

/// Scores one window with the default kernel.
pub fn score_ncc_at(level: &ScoringLevel<'_>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
    <NccKernel as Kernel>::score_at(level, plan, x, y)
}
