//! Error types for gatematch.

use crate::template::{LayerType, TemplateId};
use thiserror::Error;

/// Result alias for gatematch operations.
pub type GateMatchResult<T> = std::result::Result<T, GateMatchError>;

/// Errors that can occur while preparing templates or running a match.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GateMatchError {
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is shorter than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer cannot hold the requested raster.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Requested region does not fit inside the raster.
    #[error(
        "roi ({x}, {y}) {width}x{height} out of bounds for {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Pyramid factor must be at least 1.
    #[error("invalid pyramid factor {factor}")]
    InvalidFactor { factor: usize },
    /// Template cannot be correlated (flat or too small after scaling).
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// Template carries no raster for the layer type being matched.
    #[error("template {template} has no image for the {layer:?} layer")]
    MissingLayerImage {
        template: TemplateId,
        layer: LayerType,
    },
    /// Matcher or compile configuration is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The layer image for the search area could not be obtained.
    #[error("layer image unavailable: {reason}")]
    LayerUnavailable { reason: String },
    /// The circuit model refused an insertion or port binding.
    #[error("model error: {reason}")]
    Model { reason: String },
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
