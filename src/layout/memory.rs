//! Vector-backed layer and layout for tools and tests.
//!
//! `MemoryLayout` scans its gate list linearly; it suits the CLI and tests,
//! not full-chip models with many thousands of gates.

use crate::geometry::Rect;
use crate::image::OwnedImage;
use crate::layout::{GateModel, LayerPosition, LayerSource, SpatialIndex};
use crate::template::{GateTemplate, Orientation, TemplateId, TemplatePort};
use crate::util::{GateMatchError, GateMatchResult};
use std::collections::HashMap;

/// Layer image held in memory; the layer origin is pixel `(0, 0)`.
#[derive(Clone, Debug)]
pub struct MemoryLayer {
    image: OwnedImage,
}

impl MemoryLayer {
    pub fn new(image: OwnedImage) -> Self {
        Self { image }
    }

    /// Rectangle covering the whole layer.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin(0, 0, self.image.width(), self.image.height())
    }
}

impl LayerSource for MemoryLayer {
    fn extract_grayscale(&self, area: Rect) -> GateMatchResult<OwnedImage> {
        let view = self
            .image
            .view()
            .roi(area.min_x, area.min_y, area.width(), area.height())
            .map_err(|err| GateMatchError::LayerUnavailable {
                reason: err.to_string(),
            })?;
        OwnedImage::from_view(view)
    }
}

/// Identifier of a gate inside a [`MemoryLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(pub u64);

/// Port of a placed gate in layer coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatePort {
    pub name: String,
    pub x: usize,
    pub y: usize,
}

/// Gate instance stored by [`MemoryLayout`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedGate {
    pub id: GateId,
    pub layer: LayerPosition,
    pub rect: Rect,
    pub orientation: Orientation,
    pub template: TemplateId,
    pub ports: Vec<GatePort>,
}

/// In-memory gate list acting as both spatial index and circuit model.
#[derive(Clone, Debug, Default)]
pub struct MemoryLayout {
    gates: Vec<PlacedGate>,
    template_ports: HashMap<TemplateId, Vec<TemplatePort>>,
    next_id: u64,
}

impl MemoryLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layout that knows the port lists of `templates`.
    pub fn with_templates(templates: &[GateTemplate]) -> Self {
        let mut layout = Self::new();
        for tpl in templates {
            layout.register_template(tpl);
        }
        layout
    }

    /// Records the ports that [`GateModel::rebind_ports`] creates for `template`.
    pub fn register_template(&mut self, template: &GateTemplate) {
        self.template_ports
            .insert(template.id(), template.ports().to_vec());
    }

    pub fn gates(&self) -> &[PlacedGate] {
        &self.gates
    }

    pub fn gate(&self, id: GateId) -> Option<&PlacedGate> {
        self.gates.iter().find(|g| g.id == id)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    fn intersecting(&self, rect: Rect) -> impl Iterator<Item = &PlacedGate> {
        self.gates.iter().filter(move |g| g.rect.intersects(&rect))
    }
}

impl SpatialIndex for MemoryLayout {
    fn region_occupied(&self, rect: Rect) -> bool {
        self.intersecting(rect).next().is_some()
    }

    fn distance_to_occupied_boundary(
        &self,
        x: usize,
        y: usize,
        horizontal: bool,
        width: usize,
        height: usize,
    ) -> usize {
        let window = Rect::from_origin(x, y, width, height);
        self.intersecting(window)
            .map(|g| {
                if horizontal {
                    g.rect.max_x - x
                } else {
                    g.rect.max_y - y
                }
            })
            .max()
            .unwrap_or(0)
    }
}

impl GateModel for MemoryLayout {
    type Handle = GateId;

    fn insert_gate(
        &mut self,
        layer: LayerPosition,
        rect: Rect,
        orientation: Orientation,
        template: TemplateId,
    ) -> GateMatchResult<GateId> {
        if rect.is_empty() {
            return Err(GateMatchError::Model {
                reason: format!("empty gate rectangle {rect:?}"),
            });
        }
        let id = GateId(self.next_id);
        self.next_id += 1;
        self.gates.push(PlacedGate {
            id,
            layer,
            rect,
            orientation,
            template,
            ports: Vec::new(),
        });
        Ok(id)
    }

    fn rebind_ports(&mut self, gate: GateId) -> GateMatchResult<()> {
        let placed = self
            .gates
            .iter_mut()
            .find(|g| g.id == gate)
            .ok_or_else(|| GateMatchError::Model {
                reason: format!("unknown gate {}", gate.0),
            })?;
        let template_ports = self
            .template_ports
            .get(&placed.template)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let (width, height) = (placed.rect.width(), placed.rect.height());
        placed.ports = template_ports
            .iter()
            .filter(|p| p.x < width && p.y < height)
            .map(|p| {
                let (x, y) = placed.orientation.apply_to_point(p.x, p.y, width, height);
                GatePort {
                    name: p.name.clone(),
                    x: placed.rect.min_x + x,
                    y: placed.rect.min_y + y,
                }
            })
            .collect();
        Ok(())
    }
}
