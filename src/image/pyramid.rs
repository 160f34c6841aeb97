//! Two-resolution raster pyramid for coarse-to-fine matching.
//!
//! Downsampling averages each `factor × factor` block with integer rounding:
//! `dst = (sum + n / 2) / n` where `n = factor²`. Trailing rows and columns
//! that do not fill a whole block are dropped, so a placement that fits at
//! native resolution always fits at the scaled resolution too.

use crate::image::{ImageView, OwnedImage};
use crate::util::{GateMatchError, GateMatchResult};

/// Downsamples a grayscale view by an integer factor.
pub fn downsample_u8(src: ImageView<'_, u8>, factor: usize) -> GateMatchResult<OwnedImage> {
    if factor == 0 {
        return Err(GateMatchError::InvalidFactor { factor });
    }
    if factor == 1 {
        return OwnedImage::from_view(src);
    }

    let dst_width = src.width() / factor;
    let dst_height = src.height() / factor;
    if dst_width == 0 || dst_height == 0 {
        return Err(GateMatchError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }

    let block = factor
        .checked_mul(factor)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or(GateMatchError::InvalidFactor { factor })?;
    let mut dst = Vec::with_capacity(dst_width * dst_height);
    let mut sums = vec![0u64; dst_width];
    for y in 0..dst_height {
        sums.iter_mut().for_each(|s| *s = 0);
        for sy in y * factor..(y + 1) * factor {
            let row = src.row(sy).ok_or(GateMatchError::BufferTooSmall {
                needed: sy * src.stride() + src.width(),
                got: src.as_slice().len(),
            })?;
            for (x, sum) in sums.iter_mut().enumerate() {
                let start = x * factor;
                *sum += row[start..start + factor]
                    .iter()
                    .map(|&v| u64::from(v))
                    .sum::<u64>();
            }
        }
        dst.extend(
            sums.iter()
                .map(|&sum| ((sum + block / 2) / block).min(u64::from(u8::MAX)) as u8),
        );
    }

    OwnedImage::new(dst, dst_width, dst_height)
}

/// Native and down-sampled copies of one raster.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    native: OwnedImage,
    scaled: OwnedImage,
    factor: usize,
}

impl ImagePyramid {
    /// Builds both resolutions from a base grayscale view.
    pub fn build_u8(base: ImageView<'_, u8>, factor: usize) -> GateMatchResult<Self> {
        let scaled = downsample_u8(base, factor)?;
        let native = OwnedImage::from_view(base)?;
        Ok(Self {
            native,
            scaled,
            factor,
        })
    }

    /// Returns the full-resolution raster.
    pub fn native(&self) -> &OwnedImage {
        &self.native
    }

    /// Returns the down-sampled raster.
    pub fn scaled(&self) -> &OwnedImage {
        &self.scaled
    }

    /// Returns the integer pyramid factor between the two levels.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Splits into `(native, scaled)` rasters.
    pub fn into_parts(self) -> (OwnedImage, OwnedImage) {
        (self.native, self.scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::{downsample_u8, ImagePyramid};
    use crate::image::ImageView;
    use crate::util::GateMatchError;

    #[test]
    fn downsample_by_two_rounds_block_means() {
        let data: Vec<u8> = (0u8..16).collect();
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let out = downsample_u8(view, 2).unwrap();
        assert_eq!((out.width(), out.height()), (2, 2));
        assert_eq!(out.data(), &[3u8, 5, 11, 13]);
    }

    #[test]
    fn downsample_drops_partial_blocks() {
        let data = vec![9u8; 7 * 5];
        let view = ImageView::from_slice(&data, 7, 5).unwrap();
        let out = downsample_u8(view, 3).unwrap();
        assert_eq!((out.width(), out.height()), (2, 1));
        assert!(out.data().iter().all(|&v| v == 9));
    }

    #[test]
    fn factor_zero_is_rejected() {
        let data = vec![0u8; 4];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        assert_eq!(
            downsample_u8(view, 0).err(),
            Some(GateMatchError::InvalidFactor { factor: 0 })
        );
    }

    #[test]
    fn large_factor_block_sums_do_not_wrap() {
        // 255 * 4200^2 exceeds u32::MAX.
        let side = 4200;
        let data = vec![255u8; side * side];
        let view = ImageView::from_slice(&data, side, side).unwrap();
        let out = downsample_u8(view, side).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
        assert_eq!(out.data(), &[255u8]);
    }

    #[test]
    fn factor_one_keeps_both_levels_identical() {
        let data: Vec<u8> = (0u8..12).collect();
        let view = ImageView::from_slice(&data, 4, 3).unwrap();
        let pyramid = ImagePyramid::build_u8(view, 1).unwrap();
        assert_eq!(pyramid.native(), pyramid.scaled());
        assert_eq!(pyramid.factor(), 1);
    }
}
