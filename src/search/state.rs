//! Search-order strategies over a shared search cursor.
//!
//! A strategy only moves the cursor in [`SearchState`]; it keeps no state of
//! its own. Every strategy:
//!
//! 1. reports exhaustion if the search area is smaller than the template,
//! 2. moves forward by `step × pyramid factor` native pixels, wrapping at the
//!    end of a row (or column),
//! 3. asks the spatial index whether the window is covered by a placed gate
//!    and, if so, jumps past the covering gates instead of stopping there.
//!
//! Grid strategies visit only the grid lines inside the area and report
//! exhaustion straight away when their grid is disabled.

use crate::geometry::Rect;
use crate::grid::PlacementGrid;
use crate::layout::SpatialIndex;

/// Order in which window positions are visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOrder {
    /// Row-major raster scan over the whole search area.
    Free,
    /// Scan along horizontal grid lines (cell rows); lines are y offsets.
    Rows(PlacementGrid),
    /// Scan along vertical grid lines (cell columns); lines are x offsets.
    Columns(PlacementGrid),
}

/// Cursor of one (template, orientation) scan.
///
/// `x`/`y` are native pixels relative to the search area's top-left corner.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) step: usize,
    area: Rect,
    tpl_width: usize,
    tpl_height: usize,
    factor: usize,
    lines: Vec<usize>,
    line: usize,
    started: bool,
    exhausted: bool,
}

impl SearchState {
    /// Current cursor position, relative to the search area.
    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    /// Current step in coarse pixels.
    pub fn step(&self) -> usize {
        self.step
    }

    pub(crate) fn set_step(&mut self, step: usize) {
        self.step = step.max(1);
    }

    /// Search area in layer coordinates.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Grid lines still to be visited, relative to the search area.
    pub fn lines(&self) -> &[usize] {
        self.lines.get(self.line..).unwrap_or_default()
    }

    /// Largest valid window corner, or `None` if the template does not fit.
    fn max_position(&self) -> Option<(usize, usize)> {
        let max_x = self.area.width().checked_sub(self.tpl_width)?;
        let max_y = self.area.height().checked_sub(self.tpl_height)?;
        Some((max_x, max_y))
    }

    fn stride(&self) -> usize {
        self.step * self.factor
    }

    /// Window at the cursor in layer coordinates.
    pub fn window(&self) -> Rect {
        Rect::from_origin(
            self.area.min_x + self.x,
            self.area.min_y + self.y,
            self.tpl_width,
            self.tpl_height,
        )
    }

    /// Distance to jump past placed gates covering the current window.
    fn occupied_skip<I: SpatialIndex + ?Sized>(&self, index: &I, horizontal: bool) -> usize {
        let window = self.window();
        if !index.region_occupied(window) {
            return 0;
        }
        index
            .distance_to_occupied_boundary(
                window.min_x,
                window.min_y,
                horizontal,
                self.tpl_width,
                self.tpl_height,
            )
            .max(1)
    }

    /// Distance to move before checking the next position.
    fn pending_move(&mut self) -> usize {
        if self.started {
            self.stride()
        } else {
            self.started = true;
            0
        }
    }

    fn finish(&mut self) -> bool {
        self.exhausted = true;
        false
    }
}

impl SearchOrder {
    /// Creates the cursor for scanning `area` with a `width × height` template.
    ///
    /// `max_step` is the initial step; `factor` converts coarse steps to
    /// native pixels.
    pub fn start(
        &self,
        area: Rect,
        width: usize,
        height: usize,
        max_step: usize,
        factor: usize,
    ) -> SearchState {
        let mut state = SearchState {
            x: 0,
            y: 0,
            step: max_step.max(1),
            area,
            tpl_width: width,
            tpl_height: height,
            factor: factor.max(1),
            lines: Vec::new(),
            line: 0,
            started: false,
            exhausted: false,
        };
        if let Some((max_x, max_y)) = state.max_position() {
            state.lines = match self {
                SearchOrder::Free => Vec::new(),
                SearchOrder::Rows(grid) => relative_lines(grid, area.min_y, max_y),
                SearchOrder::Columns(grid) => relative_lines(grid, area.min_x, max_x),
            };
        }
        state
    }

    /// Moves the cursor to the next unoccupied window.
    ///
    /// Returns false once the scan is exhausted; further calls keep returning
    /// false.
    pub fn advance<I: SpatialIndex + ?Sized>(&self, state: &mut SearchState, index: &I) -> bool {
        if state.exhausted {
            return false;
        }
        let Some((max_x, max_y)) = state.max_position() else {
            return state.finish();
        };
        match self {
            SearchOrder::Free => advance_free(state, index, max_x, max_y),
            SearchOrder::Rows(_) => advance_rows(state, index, max_x),
            SearchOrder::Columns(_) => advance_columns(state, index, max_y),
        }
    }
}

fn relative_lines(grid: &PlacementGrid, origin: usize, max_offset: usize) -> Vec<usize> {
    grid.lines_within(origin, origin + max_offset)
        .into_iter()
        .map(|line| line - origin)
        .collect()
}

fn advance_free<I: SpatialIndex + ?Sized>(
    state: &mut SearchState,
    index: &I,
    max_x: usize,
    max_y: usize,
) -> bool {
    let mut pending = state.pending_move();
    loop {
        state.x += pending;
        if state.x > max_x {
            state.x = 0;
            state.y += state.stride();
        }
        if state.y > max_y {
            return state.finish();
        }
        pending = state.occupied_skip(index, true);
        if pending == 0 {
            return true;
        }
    }
}

fn advance_rows<I: SpatialIndex + ?Sized>(state: &mut SearchState, index: &I, max_x: usize) -> bool {
    let mut pending = state.pending_move();
    loop {
        state.x += pending;
        if state.x > max_x {
            state.x = 0;
            state.line += 1;
        }
        let Some(&y) = state.lines.get(state.line) else {
            return state.finish();
        };
        state.y = y;
        pending = state.occupied_skip(index, true);
        if pending == 0 {
            return true;
        }
    }
}

fn advance_columns<I: SpatialIndex + ?Sized>(
    state: &mut SearchState,
    index: &I,
    max_y: usize,
) -> bool {
    let mut pending = state.pending_move();
    loop {
        state.y += pending;
        if state.y > max_y {
            state.y = 0;
            state.line += 1;
        }
        let Some(&x) = state.lines.get(state.line) else {
            return state.finish();
        };
        state.x = x;
        pending = state.occupied_skip(index, false);
        if pending == 0 {
            return true;
        }
    }
}
