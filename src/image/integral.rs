//! Summation tables (integral images) for O(1) window statistics.
//!
//! `sum[y * width + x]` holds the sum over the closed rectangle
//! `[0, x] × [0, y]`; `sum_sq` holds the same for squared intensities. Any
//! rectangle sum then follows from four lookups:
//! `S(x2, y2) − S(x1 − 1, y2) − S(x2, y1 − 1) + S(x1 − 1, y1 − 1)`, where
//! terms with a negative coordinate are zero. Accumulation is exact in `u64`.

use crate::image::ImageView;

/// Sum and sum-of-squares integral images for one raster resolution.
#[derive(Clone, Debug)]
pub struct SummationTable {
    width: usize,
    height: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl SummationTable {
    /// Builds both tables in a single row-major pass.
    pub fn build(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let mut sum = vec![0u64; width * height];
        let mut sum_sq = vec![0u64; width * height];

        for y in 0..height {
            let Some(row) = image.row(y) else { break };
            let mut row_sum = 0u64;
            let mut row_sum_sq = 0u64;
            for (x, &value) in row.iter().enumerate() {
                let v = u64::from(value);
                row_sum += v;
                row_sum_sq += v * v;

                let idx = y * width + x;
                let (above, above_sq) = if y > 0 {
                    (sum[idx - width], sum_sq[idx - width])
                } else {
                    (0, 0)
                };
                sum[idx] = row_sum + above;
                sum_sq[idx] = row_sum_sq + above_sq;
            }
        }

        Self {
            width,
            height,
            sum,
            sum_sq,
        }
    }

    /// Returns the table width (equal to the source raster width).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the table height (equal to the source raster height).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of intensities over the closed rectangle `(x1, y1)-(x2, y2)`.
    ///
    /// Returns `None` if the corners are inverted or outside the raster.
    pub fn rect_sum(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> Option<u64> {
        self.lookup(&self.sum, x1, y1, x2, y2)
    }

    /// Sum of squared intensities over the closed rectangle `(x1, y1)-(x2, y2)`.
    pub fn rect_sum_sq(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> Option<u64> {
        self.lookup(&self.sum_sq, x1, y1, x2, y2)
    }

    /// Returns `(Σf, Σf²)` for the `width × height` window with top-left `(x, y)`.
    pub fn window_stats(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Option<(f64, f64)> {
        if width == 0 || height == 0 {
            return None;
        }
        let x2 = x.checked_add(width - 1)?;
        let y2 = y.checked_add(height - 1)?;
        let sum = self.rect_sum(x, y, x2, y2)?;
        let sum_sq = self.rect_sum_sq(x, y, x2, y2)?;
        Some((sum as f64, sum_sq as f64))
    }

    fn lookup(&self, table: &[u64], x1: usize, y1: usize, x2: usize, y2: usize) -> Option<u64> {
        if x1 > x2 || y1 > y2 || x2 >= self.width || y2 >= self.height {
            return None;
        }
        let at = |x: usize, y: usize| table[y * self.width + x];
        let full = at(x2, y2);
        let left = if x1 > 0 { at(x1 - 1, y2) } else { 0 };
        let top = if y1 > 0 { at(x2, y1 - 1) } else { 0 };
        let corner = if x1 > 0 && y1 > 0 {
            at(x1 - 1, y1 - 1)
        } else {
            0
        };
        // The rectangle sum is non-negative, so this ordering never underflows.
        Some((full + corner) - (left + top))
    }
}

#[cfg(test)]
mod tests {
    use super::SummationTable;
    use crate::image::ImageView;

    #[test]
    fn table_holds_prefix_sums() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let view = ImageView::from_slice(&data, 3, 2).unwrap();
        let table = SummationTable::build(view);
        assert_eq!(table.rect_sum(0, 0, 0, 0), Some(1));
        assert_eq!(table.rect_sum(0, 0, 2, 0), Some(6));
        assert_eq!(table.rect_sum(0, 0, 2, 1), Some(21));
        assert_eq!(table.rect_sum(1, 1, 2, 1), Some(11));
        assert_eq!(table.rect_sum_sq(1, 0, 1, 1), Some(4 + 25));
    }

    #[test]
    fn out_of_range_queries_return_none() {
        let data = [7u8; 4];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let table = SummationTable::build(view);
        assert_eq!(table.rect_sum(0, 0, 2, 0), None);
        assert_eq!(table.rect_sum(1, 0, 0, 0), None);
        assert_eq!(table.window_stats(1, 1, 2, 1), None);
        assert_eq!(table.window_stats(0, 0, 2, 2), Some((28.0, 196.0)));
    }

    #[test]
    fn strided_views_ignore_padding() {
        let data = [1u8, 1, 200, 1, 1, 200];
        let view = ImageView::new(&data, 2, 2, 3).unwrap();
        let table = SummationTable::build(view);
        assert_eq!(table.rect_sum(0, 0, 1, 1), Some(4));
    }
}
