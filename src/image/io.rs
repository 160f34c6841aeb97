//! Loading layer and template rasters via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage};
use crate::util::{GateMatchError, GateMatchResult};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> GateMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Converts any decoded image to an owned 8-bit grayscale raster.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> GateMatchResult<OwnedImage> {
    let gray = img.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    OwnedImage::new(gray.into_raw(), width, height)
}

/// Loads an image from disk and converts it to a grayscale owned raster.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> GateMatchResult<OwnedImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| GateMatchError::ImageIo {
        reason: format!("{}: {err}", path.display()),
    })?;
    owned_from_dynamic_image(&img)
}
