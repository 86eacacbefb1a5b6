//! Overlay measurement pipeline.
//!
//! Runs the coarse locator, refines all eight edges, checks their ordering and
//! converts the overlay error to physical units.

mod error;
mod params;
mod pipeline;
mod result;
mod stats;

pub use error::OverlayError;
pub use params::OverlayParams;
pub use pipeline::{OverlayPipeline, PipelineState};
pub use result::{OverlayResult, PixelScale};
pub use stats::OverlayStats;
