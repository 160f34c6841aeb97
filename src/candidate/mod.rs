//! Scored window positions.

/// A window position and its correlation score.
///
/// Coordinates are native-resolution pixels relative to the search area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchCandidate {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

impl MatchCandidate {
    pub fn new(x: usize, y: usize, score: f32) -> Self {
        Self { x, y, score }
    }
}
