//! Collaborators owned by the surrounding application.
//!
//! The matcher reads pixels through [`LayerSource`], checks occupancy through
//! [`SpatialIndex`] and inserts gates through [`GateModel`]. [`place_gate`] is
//! the only place where shared model state is mutated; it takes the layout
//! by `&mut`, so the occupancy check and the insertion form one step. Callers
//! that share a layout between concurrent runs must wrap it in a lock held
//! around the whole call.

use crate::geometry::Rect;
use crate::image::OwnedImage;
use crate::template::{Orientation, TemplateId};
use crate::util::{GateMatchError, GateMatchResult};
use std::fmt::Debug;

pub mod memory;

/// Index of a layer in the layer stack.
pub type LayerPosition = usize;

/// Source of grayscale layer pixels.
pub trait LayerSource {
    /// Returns the pixels covering `area`; the raster must be `area`-sized.
    fn extract_grayscale(&self, area: Rect) -> GateMatchResult<OwnedImage>;
}

/// Occupancy queries against already placed gates.
pub trait SpatialIndex {
    /// Returns true if any placed gate intersects `rect`.
    fn region_occupied(&self, rect: Rect) -> bool;

    /// Distance from `(x, y)` along the scan axis to the far edge of the
    /// placed gates intersecting the `width × height` window at `(x, y)`.
    ///
    /// `horizontal` selects the x axis. Returns 0 when the window is free.
    fn distance_to_occupied_boundary(
        &self,
        x: usize,
        y: usize,
        horizontal: bool,
        width: usize,
        height: usize,
    ) -> usize;
}

/// Gate insertion into the circuit model.
pub trait GateModel {
    /// Handle identifying an inserted gate.
    type Handle: Copy + Debug;

    /// Creates a gate instance of `template` covering `rect`.
    fn insert_gate(
        &mut self,
        layer: LayerPosition,
        rect: Rect,
        orientation: Orientation,
        template: TemplateId,
    ) -> GateMatchResult<Self::Handle>;

    /// Creates or refreshes the ports of `gate` from its template.
    fn rebind_ports(&mut self, gate: Self::Handle) -> GateMatchResult<()>;
}

/// Outcome of a placement request.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement<H> {
    /// A new gate was inserted and its ports bound.
    Placed(H),
    /// The gate was inserted and still occupies `rect`, but port binding failed.
    PlacedUnbound(H, GateMatchError),
    /// Another gate already covers part of the rectangle.
    Occupied,
}

/// Inserts a gate for an accepted match unless the area is already claimed.
///
/// Errors only when the model refuses the insertion; once a gate exists it is
/// always returned, bound or not.
pub fn place_gate<L>(
    layout: &mut L,
    layer: LayerPosition,
    rect: Rect,
    orientation: Orientation,
    template: TemplateId,
) -> GateMatchResult<Placement<L::Handle>>
where
    L: SpatialIndex + GateModel + ?Sized,
{
    if layout.region_occupied(rect) {
        return Ok(Placement::Occupied);
    }
    let handle = layout.insert_gate(layer, rect, orientation, template)?;
    match layout.rebind_ports(handle) {
        Ok(()) => Ok(Placement::Placed(handle)),
        Err(error) => Ok(Placement::PlacedUnbound(handle, error)),
    }
}
