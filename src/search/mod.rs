//! Matching driver: scans every prepared pair over a layer area and places
//! accepted matches.
//!
//! A run may consist of several passes. Pass `i` of `n` uses the thresholds
//! `t + (1 − t) · (n − 1 − i) / n`, so the first pass only accepts very strong
//! matches and the last pass uses the configured thresholds. Pairs are scanned
//! in bank order and placements happen one at a time on the caller's layout,
//! which keeps results deterministic.

pub(crate) mod coarse;
pub mod refine;
pub mod state;
pub mod step;

use crate::bank::{RejectedTemplate, TemplateBank};
use crate::geometry::Rect;
use crate::image::pyramid::ImagePyramid;
use crate::kernel::IndexedImage;
use crate::layout::{GateModel, LayerPosition, LayerSource, SpatialIndex};
use crate::progress::MatchProgress;
use crate::search::coarse::{scan_pair, ScanContext, ScanEnd};
use crate::template::{Orientation, TemplateId};
use crate::trace::{trace_event, trace_span};
use crate::util::{GateMatchError, GateMatchResult};
use std::time::{Duration, Instant};

pub use refine::{hill_climb, ClimbOutcome};
pub use state::{SearchOrder, SearchState};
pub use step::adaptive_step;

/// Configuration for a matching run.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Layer the placed gates are recorded on.
    pub layer_position: LayerPosition,
    /// Order in which windows are visited.
    pub order: SearchOrder,
    /// Coarse score needed to start hill climbing.
    pub threshold_hc: f32,
    /// Refined score needed to place a gate.
    pub threshold_detection: f32,
    /// Number of passes with progressively relaxed thresholds.
    pub threshold_steps: usize,
    /// Largest cursor step, in coarse pixels.
    pub max_step: usize,
    /// Chebyshev radius of the hill-climb neighborhood.
    pub hill_climb_radius: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            layer_position: 0,
            order: SearchOrder::Free,
            threshold_hc: 0.40,
            threshold_detection: 0.70,
            threshold_steps: 1,
            max_step: 4,
            hill_climb_radius: 1,
        }
    }
}

impl MatchConfig {
    /// Checks threshold ranges and the step/radius/pass counts.
    pub fn validate(&self) -> GateMatchResult<()> {
        let in_range = |t: f32| (-1.0..=1.0).contains(&t);
        if !in_range(self.threshold_hc) {
            return Err(GateMatchError::InvalidConfig(
                "threshold_hc must be in [-1, 1]",
            ));
        }
        if !in_range(self.threshold_detection) {
            return Err(GateMatchError::InvalidConfig(
                "threshold_detection must be in [-1, 1]",
            ));
        }
        if self.threshold_steps == 0 {
            return Err(GateMatchError::InvalidConfig(
                "threshold_steps must be at least 1",
            ));
        }
        if self.max_step == 0 {
            return Err(GateMatchError::InvalidConfig("max_step must be at least 1"));
        }
        if self.hill_climb_radius == 0 {
            return Err(GateMatchError::InvalidConfig(
                "hill_climb_radius must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Thresholds in effect during one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub hill_climb: f32,
    pub detection: f32,
}

impl Thresholds {
    /// Thresholds for pass `pass` (zero-based) of `cfg.threshold_steps`.
    pub fn for_pass(cfg: &MatchConfig, pass: usize) -> Self {
        let steps = cfg.threshold_steps.max(1);
        let remaining = steps.saturating_sub(pass + 1) as f32 / steps as f32;
        let relax = |t: f32| t + (1.0 - t) * remaining;
        Self {
            hill_climb: relax(cfg.threshold_hc),
            detection: relax(cfg.threshold_detection),
        }
    }
}

/// A gate placed during a run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedMatch<H> {
    pub handle: H,
    /// Gate rectangle in layer coordinates.
    pub rect: Rect,
    pub template: TemplateId,
    pub orientation: Orientation,
    /// Refined native-resolution score.
    pub score: f32,
}

/// An accepted match the model refused to insert or bind.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementFailure<H> {
    /// The inserted gate when only port binding failed.
    pub gate: Option<H>,
    pub template: TemplateId,
    pub orientation: Orientation,
    pub rect: Rect,
    pub error: GateMatchError,
}

/// Outcome and statistics of [`Matcher::run`].
#[derive(Clone, Debug)]
pub struct MatchReport<H> {
    /// Placed gates in placement order.
    pub placed: Vec<PlacedMatch<H>>,
    /// Pairs that never reached the scan.
    pub rejected: Vec<RejectedTemplate>,
    pub failures: Vec<PlacementFailure<H>>,
    /// Accepted matches dropped because the area was already occupied.
    pub conflicts: usize,
    pub candidates_scored: usize,
    pub hill_climbs: usize,
    pub passes_completed: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl<H> MatchReport<H> {
    fn new(rejected: Vec<RejectedTemplate>) -> Self {
        Self {
            placed: Vec::new(),
            rejected,
            failures: Vec::new(),
            conflicts: 0,
            candidates_scored: 0,
            hill_climbs: 0,
            passes_completed: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// Template matcher over a prepared bank.
#[derive(Clone, Debug)]
pub struct Matcher {
    bank: TemplateBank,
    cfg: MatchConfig,
}

impl Matcher {
    /// Creates a matcher with the default configuration.
    pub fn new(bank: TemplateBank) -> Self {
        Self {
            bank,
            cfg: MatchConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn bank(&self) -> &TemplateBank {
        &self.bank
    }

    /// Matches every prepared pair against `area` of `layer` and places the
    /// accepted gates into `layout`.
    ///
    /// Only an invalid configuration or an unreadable layer returns `Err`.
    /// Per-match problems end up in the report. On cancellation the gates
    /// placed so far stay in `layout` and the report has `cancelled` set.
    pub fn run<S, L>(
        &self,
        layer: &S,
        layout: &mut L,
        area: Rect,
        progress: &MatchProgress,
    ) -> GateMatchResult<MatchReport<L::Handle>>
    where
        S: LayerSource + ?Sized,
        L: SpatialIndex + GateModel + ?Sized,
    {
        self.cfg.validate()?;
        let start = Instant::now();
        let _span = trace_span!(
            "match_run",
            pairs = self.bank.len(),
            passes = self.cfg.threshold_steps
        )
        .entered();

        let mut report = MatchReport::new(self.bank.rejected().to_vec());
        let factor = self.bank.factor();
        progress.begin(self.cfg.threshold_steps * self.bank.len());

        // Areas smaller than the factor cannot hold any prepared template.
        let levels = if area.width() < factor || area.height() < factor {
            None
        } else {
            let raster = layer.extract_grayscale(area)?;
            if raster.width() != area.width() || raster.height() != area.height() {
                return Err(GateMatchError::LayerUnavailable {
                    reason: format!(
                        "layer returned {}x{} pixels for a {}x{} area",
                        raster.width(),
                        raster.height(),
                        area.width(),
                        area.height()
                    ),
                });
            }
            let (native, scaled) = ImagePyramid::build_u8(raster.view(), factor)?.into_parts();
            Some((IndexedImage::new(native), IndexedImage::new(scaled)))
        };

        'passes: for pass in 0..self.cfg.threshold_steps {
            let thresholds = Thresholds::for_pass(&self.cfg, pass);
            let _pass_span = trace_span!(
                "match_pass",
                pass = pass,
                threshold_hc = thresholds.hill_climb,
                threshold_detection = thresholds.detection
            )
            .entered();

            for pair in self.bank.prepared() {
                if progress.is_cancelled() {
                    report.cancelled = true;
                    break 'passes;
                }
                if let Some((native, scaled)) = &levels {
                    let ctx = ScanContext {
                        native: native.level(),
                        scaled: scaled.level(),
                        area,
                        factor,
                        order: &self.cfg.order,
                        layer_position: self.cfg.layer_position,
                        max_step: self.cfg.max_step,
                        radius: self.cfg.hill_climb_radius,
                        progress,
                    };
                    if scan_pair(&ctx, pair, thresholds, layout, &mut report) == ScanEnd::Cancelled
                    {
                        report.cancelled = true;
                        break 'passes;
                    }
                }
                progress.step();
            }
            report.passes_completed += 1;
        }

        report.elapsed = start.elapsed();
        trace_event!(
            "match_finished",
            placed = report.placed.len(),
            conflicts = report.conflicts,
            cancelled = report.cancelled
        );
        Ok(report)
    }
}
