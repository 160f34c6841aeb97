//! Cell-placement grids used to prune the search.
//!
//! Standard cells sit on rows (horizontal grid lines, given as y offsets) or
//! columns (vertical grid lines, given as x offsets). A grid is either regular
//! (`offset + k · distance`) or an explicit list of offsets.

/// Spacing of grid lines along one axis, in layer pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridSpacing {
    Regular { offset: usize, distance: usize },
    Irregular { offsets: Vec<usize> },
}

/// One placement grid plus its enabled flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementGrid {
    spacing: GridSpacing,
    enabled: bool,
}

impl PlacementGrid {
    /// Regular grid with lines at `offset + k · distance`.
    pub fn regular(offset: usize, distance: usize) -> Self {
        Self {
            spacing: GridSpacing::Regular { offset, distance },
            enabled: true,
        }
    }

    /// Irregular grid; offsets are sorted and deduplicated.
    pub fn irregular(mut offsets: Vec<usize>) -> Self {
        offsets.sort_unstable();
        offsets.dedup();
        Self {
            spacing: GridSpacing::Irregular { offsets },
            enabled: true,
        }
    }

    /// Returns the same grid with the enabled flag set to `enabled`.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn spacing(&self) -> &GridSpacing {
        &self.spacing
    }

    /// Grid lines inside the closed range `[min, max]`, ascending.
    ///
    /// A disabled grid, or a regular grid with zero distance, has no lines.
    pub fn lines_within(&self, min: usize, max: usize) -> Vec<usize> {
        if !self.enabled || min > max {
            return Vec::new();
        }
        match &self.spacing {
            GridSpacing::Regular { offset, distance } => {
                if *distance == 0 {
                    return Vec::new();
                }
                let first = if min <= *offset {
                    *offset
                } else {
                    offset + (min - offset).div_ceil(*distance) * distance
                };
                (first..=max).step_by(*distance).collect()
            }
            GridSpacing::Irregular { offsets } => offsets
                .iter()
                .copied()
                .filter(|&o| o >= min && o <= max)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlacementGrid;

    #[test]
    fn regular_lines_start_at_first_line_inside_range() {
        let grid = PlacementGrid::regular(3, 10);
        assert_eq!(grid.lines_within(0, 40), vec![3, 13, 23, 33]);
        assert_eq!(grid.lines_within(14, 33), vec![23, 33]);
        assert_eq!(grid.lines_within(13, 13), vec![13]);
        assert!(grid.lines_within(34, 42).is_empty());
    }

    #[test]
    fn irregular_lines_are_sorted_and_filtered() {
        let grid = PlacementGrid::irregular(vec![30, 4, 17, 4]);
        assert_eq!(grid.lines_within(0, 100), vec![4, 17, 30]);
        assert_eq!(grid.lines_within(5, 29), vec![17]);
    }

    #[test]
    fn disabled_or_zero_distance_grids_have_no_lines() {
        assert!(PlacementGrid::regular(0, 8)
            .with_enabled(false)
            .lines_within(0, 100)
            .is_empty());
        assert!(PlacementGrid::regular(0, 0).lines_within(0, 100).is_empty());
    }
}
