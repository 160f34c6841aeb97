//! Layer-space rectangles.

/// Axis-aligned rectangle covering `[min_x, max_x) × [min_y, max_y)`.
///
/// Coordinates are layer pixels. A gate placed at `(5, 5)` from a 6×6
/// template covers `(5, 5)-(11, 11)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Rect {
    /// Creates a rectangle from its corners; `max` is exclusive.
    pub fn new(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a rectangle from its top-left corner and size.
    pub fn from_origin(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> usize {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns true when both rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns true when `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }
}
