//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the summation table, template plans, correlation kernels and
//! the search primitives used by [`Matcher`](crate::Matcher). Most users only
//! need the top-level `TemplateBank` and `Matcher` types.

pub use crate::bank::processing_order;
pub use crate::image::integral::SummationTable;
pub use crate::image::pyramid::downsample_u8;
pub use crate::kernel::scalar::NccScalar;
pub use crate::kernel::{score_ncc_at, IndexedImage, Kernel, NccKernel, ScoringLevel, NO_MATCH};
pub use crate::search::{adaptive_step, hill_climb, ClimbOutcome, SearchState};
pub use crate::template::{orient_u8, TemplatePlan};
