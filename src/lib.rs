//! GateMatch recognizes standard-cell gates in photographed IC layers.
//!
//! Gate templates are matched against a layer area with normalized
//! cross-correlation: a coarse scan on a down-sampled copy with a score-driven
//! step, steepest-ascent refinement at full resolution, and placement into the
//! caller's circuit model unless another gate already claims the area.
//! Optional features add parallel template preparation (`rayon`), a SIMD
//! numerator loop (`simd`), image decoding (`image-io`) and `tracing` spans.
//!
//! ```no_run
//! use gatematch::layout::memory::{MemoryLayer, MemoryLayout};
//! use gatematch::{CompileConfig, GateTemplate, MatchProgress, Matcher, TemplateBank};
//! # fn demo(layer: MemoryLayer, templates: Vec<GateTemplate>) -> gatematch::GateMatchResult<()> {
//! let bank = TemplateBank::compile(&templates, &CompileConfig::default())?;
//! let mut layout = MemoryLayout::with_templates(&templates);
//! let report = Matcher::new(bank).run(&layer, &mut layout, layer.bounds(), &MatchProgress::new())?;
//! println!("placed {} gates", report.placed.len());
//! # Ok(())
//! # }
//! ```

pub mod bank;
mod candidate;
pub mod geometry;
pub mod grid;
pub mod image;
pub mod kernel;
pub mod layout;
pub mod lowlevel;
pub mod progress;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use bank::{CompileConfig, PreparedTemplate, RejectedTemplate, TemplateBank};
pub use candidate::MatchCandidate;
pub use geometry::Rect;
pub use grid::{GridSpacing, PlacementGrid};
pub use image::pyramid::ImagePyramid;
pub use image::{ImageView, OwnedImage};
pub use layout::{place_gate, GateModel, LayerPosition, LayerSource, Placement, SpatialIndex};
pub use progress::MatchProgress;
pub use search::{
    MatchConfig, MatchReport, Matcher, PlacedMatch, PlacementFailure, SearchOrder, Thresholds,
};
pub use template::{GateTemplate, LayerType, Orientation, TemplateId, TemplatePort};
pub use util::{GateMatchError, GateMatchResult};
