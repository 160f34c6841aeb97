//! Mirror orientations of gate templates.

use crate::image::{ImageView, OwnedImage};
use crate::util::GateMatchResult;

/// Placement orientation of a gate relative to its template.
///
/// Standard cells are mirrored, never rotated, when placed in rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Identity,
    /// Mirrored top-to-bottom.
    FlipVertical,
    /// Mirrored left-to-right.
    FlipHorizontal,
    FlipBoth,
}

impl Orientation {
    /// All orientations in the order they are tried by default.
    pub const ALL: [Orientation; 4] = [
        Orientation::Identity,
        Orientation::FlipVertical,
        Orientation::FlipHorizontal,
        Orientation::FlipBoth,
    ];

    pub fn flips_horizontal(self) -> bool {
        matches!(self, Orientation::FlipHorizontal | Orientation::FlipBoth)
    }

    pub fn flips_vertical(self) -> bool {
        matches!(self, Orientation::FlipVertical | Orientation::FlipBoth)
    }

    /// Maps a template-local point into the oriented `width × height` frame.
    pub fn apply_to_point(self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        let x = if self.flips_horizontal() { width - 1 - x } else { x };
        let y = if self.flips_vertical() { height - 1 - y } else { y };
        (x, y)
    }
}

/// Returns a contiguous copy of `src` in the given orientation.
pub fn orient_u8(src: ImageView<'_, u8>, orientation: Orientation) -> GateMatchResult<OwnedImage> {
    let width = src.width();
    let height = src.height();
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let src_y = if orientation.flips_vertical() {
            height - 1 - y
        } else {
            y
        };
        let Some(row) = src.row(src_y) else { break };
        if orientation.flips_horizontal() {
            out.extend(row.iter().rev());
        } else {
            out.extend_from_slice(row);
        }
    }
    OwnedImage::new(out, width, height)
}

#[cfg(test)]
mod tests {
    use super::{orient_u8, Orientation};
    use crate::image::ImageView;

    #[test]
    fn flips_move_pixels_to_mirrored_positions() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let view = ImageView::from_slice(&data, 3, 2).unwrap();

        let h = orient_u8(view, Orientation::FlipHorizontal).unwrap();
        assert_eq!(h.data(), &[3u8, 2, 1, 6, 5, 4]);
        let v = orient_u8(view, Orientation::FlipVertical).unwrap();
        assert_eq!(v.data(), &[4u8, 5, 6, 1, 2, 3]);
        let both = orient_u8(view, Orientation::FlipBoth).unwrap();
        assert_eq!(both.data(), &[6u8, 5, 4, 3, 2, 1]);
        let same = orient_u8(view, Orientation::Identity).unwrap();
        assert_eq!(same.data(), &data);
    }

    #[test]
    fn point_mapping_agrees_with_raster_flip() {
        let data: Vec<u8> = (0u8..20).collect();
        let view = ImageView::from_slice(&data, 5, 4).unwrap();
        for orientation in Orientation::ALL {
            let oriented = orient_u8(view, orientation).unwrap();
            let (x, y) = orientation.apply_to_point(1, 2, 5, 4);
            assert_eq!(oriented.get(x, y), view.get(1, 2).copied());
        }
    }
}
