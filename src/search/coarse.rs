//! Scan of one (template, orientation) pair over the search area.
//!
//! The cursor walks the area in native pixels. Each visited window is scored
//! on the down-sampled level at `(x / factor, y / factor)`; windows scoring at
//! least the hill-climb threshold are refined at native resolution and placed
//! when the refined score reaches the detection threshold.

use crate::bank::PreparedTemplate;
use crate::candidate::MatchCandidate;
use crate::geometry::Rect;
use crate::kernel::{Kernel, NccKernel, ScoringLevel};
use crate::layout::{place_gate, GateModel, LayerPosition, Placement, SpatialIndex};
use crate::progress::MatchProgress;
use crate::search::refine::hill_climb;
use crate::search::state::SearchOrder;
use crate::search::step::adaptive_step;
use crate::search::{MatchReport, PlacedMatch, PlacementFailure, Thresholds};
use crate::trace::{trace_event, trace_span};

/// How a pair scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScanEnd {
    Exhausted,
    Cancelled,
}

/// Everything a pair scan reads but does not own.
pub(crate) struct ScanContext<'a> {
    pub(crate) native: ScoringLevel<'a>,
    pub(crate) scaled: ScoringLevel<'a>,
    pub(crate) area: Rect,
    pub(crate) factor: usize,
    pub(crate) order: &'a SearchOrder,
    pub(crate) layer_position: LayerPosition,
    pub(crate) max_step: usize,
    pub(crate) radius: usize,
    pub(crate) progress: &'a MatchProgress,
}

/// Scans one prepared pair, placing accepted matches into `layout`.
pub(crate) fn scan_pair<L>(
    ctx: &ScanContext<'_>,
    pair: &PreparedTemplate,
    thresholds: Thresholds,
    layout: &mut L,
    report: &mut MatchReport<L::Handle>,
) -> ScanEnd
where
    L: SpatialIndex + GateModel + ?Sized,
{
    let _span = trace_span!(
        "scan_pair",
        template = pair.template().0,
        orientation = ?pair.orientation()
    )
    .entered();

    let factor = ctx.factor;
    let mut state = ctx.order.start(
        ctx.area,
        pair.width(),
        pair.height(),
        ctx.max_step,
        factor,
    );
    let mut scored = 0usize;
    let mut placed = 0usize;

    while ctx.order.advance(&mut state, &*layout) {
        let (x, y) = state.position();
        let coarse = NccKernel::score_at(&ctx.scaled, pair.scaled(), x / factor, y / factor);
        scored += 1;
        report.candidates_scored += 1;
        state.set_step(adaptive_step(coarse, ctx.max_step));
        if ctx.progress.is_cancelled() {
            return ScanEnd::Cancelled;
        }
        if coarse < thresholds.hill_climb {
            continue;
        }

        let seed_score = NccKernel::score_at(&ctx.native, pair.native(), x, y);
        let outcome = hill_climb::<NccKernel>(
            &ctx.native,
            pair.native(),
            MatchCandidate::new(x, y, seed_score),
            ctx.radius,
        );
        report.hill_climbs += 1;
        if ctx.progress.is_cancelled() {
            return ScanEnd::Cancelled;
        }

        let best = outcome.best;
        if best.score < thresholds.detection {
            continue;
        }
        let rect = Rect::from_origin(
            ctx.area.min_x + best.x,
            ctx.area.min_y + best.y,
            pair.width(),
            pair.height(),
        );
        match place_gate(
            layout,
            ctx.layer_position,
            rect,
            pair.orientation(),
            pair.template(),
        ) {
            Ok(Placement::Placed(handle)) => {
                trace_event!(
                    "gate_placed",
                    template = pair.template().0,
                    x = rect.min_x,
                    y = rect.min_y,
                    score = best.score
                );
                placed += 1;
                report.placed.push(PlacedMatch {
                    handle,
                    rect,
                    template: pair.template(),
                    orientation: pair.orientation(),
                    score: best.score,
                });
            }
            Ok(Placement::PlacedUnbound(handle, error)) => {
                trace_event!(
                    "ports_unbound",
                    template = pair.template().0,
                    x = rect.min_x,
                    y = rect.min_y,
                    error = error.to_string()
                );
                placed += 1;
                report.placed.push(PlacedMatch {
                    handle,
                    rect,
                    template: pair.template(),
                    orientation: pair.orientation(),
                    score: best.score,
                });
                report.failures.push(PlacementFailure {
                    gate: Some(handle),
                    template: pair.template(),
                    orientation: pair.orientation(),
                    rect,
                    error,
                });
            }
            Ok(Placement::Occupied) => report.conflicts += 1,
            Err(error) => {
                trace_event!(
                    "placement_failed",
                    template = pair.template().0,
                    error = error.to_string()
                );
                report.failures.push(PlacementFailure {
                    gate: None,
                    template: pair.template(),
                    orientation: pair.orientation(),
                    rect,
                    error,
                });
            }
        }
    }

    trace_event!(
        "pair_scanned",
        template = pair.template().0,
        scored = scored,
        placed = placed
    );
    ScanEnd::Exhausted
}
