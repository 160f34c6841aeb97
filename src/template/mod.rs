//! Gate templates: per-layer reference rasters of one standard cell.

use crate::image::{ImageView, OwnedImage};
use crate::util::{GateMatchError, GateMatchResult};
use std::collections::HashMap;
use std::fmt;

mod orient;
mod plan;

pub use orient::{orient_u8, Orientation};
pub use plan::TemplatePlan;

/// Stable identity of a gate template inside the circuit model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Photographed layer a template raster was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerType {
    Transistor,
    Logic,
    Metal,
}

/// Named connection point relative to the template's top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplatePort {
    pub name: String,
    pub x: usize,
    pub y: usize,
}

/// Reference appearance of one standard cell.
///
/// All layer rasters share the template's width and height.
#[derive(Clone, Debug)]
pub struct GateTemplate {
    id: TemplateId,
    name: String,
    width: usize,
    height: usize,
    images: HashMap<LayerType, OwnedImage>,
    ports: Vec<TemplatePort>,
}

impl GateTemplate {
    /// Creates a template without any layer rasters.
    pub fn new(id: TemplateId, name: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            id,
            name: name.into(),
            width,
            height,
            images: HashMap::new(),
            ports: Vec::new(),
        }
    }

    /// Creates a template sized after `image`, stored for `layer`.
    pub fn from_image(
        id: TemplateId,
        name: impl Into<String>,
        layer: LayerType,
        image: OwnedImage,
    ) -> Self {
        let mut tpl = Self::new(id, name, image.width(), image.height());
        tpl.images.insert(layer, image);
        tpl
    }

    /// Attaches a raster for `layer`; its size must match the template.
    pub fn with_image(mut self, layer: LayerType, image: OwnedImage) -> GateMatchResult<Self> {
        if image.width() != self.width || image.height() != self.height {
            return Err(GateMatchError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }
        self.images.insert(layer, image);
        Ok(self)
    }

    /// Adds a port; ports outside the template extent are rejected.
    pub fn with_port(mut self, name: impl Into<String>, x: usize, y: usize) -> GateMatchResult<Self> {
        if x >= self.width || y >= self.height {
            return Err(GateMatchError::RoiOutOfBounds {
                x,
                y,
                width: 1,
                height: 1,
                img_width: self.width,
                img_height: self.height,
            });
        }
        self.ports.push(TemplatePort {
            name: name.into(),
            x,
            y,
        });
        Ok(self)
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel area used to order templates largest-first.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Returns the raster for `layer`, if the template has one.
    pub fn image(&self, layer: LayerType) -> Option<ImageView<'_, u8>> {
        self.images.get(&layer).map(OwnedImage::view)
    }

    pub fn ports(&self) -> &[TemplatePort] {
        &self.ports
    }
}
