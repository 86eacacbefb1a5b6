//! High-level facade crate for the `boxmark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates under short module names
//! - (feature `image`) helpers that bridge `image::GrayImage` and run a whole
//!   measurement from a JSON configuration
//! - (feature `cli`) the `boxmark` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use boxmark::measure::{gray_view, load_gray};
//! use boxmark::{OverlayParams, OverlayPipeline, Rect};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reference = load_gray("reference.png")?;
//! let target = load_gray("wafer_site_17.png")?;
//!
//! let mut pipeline = OverlayPipeline::new(OverlayParams::default());
//! pipeline.initialize_template(&gray_view(&reference), Some(Rect::centered(320, 320, 240, 240)))?;
//! let result = pipeline.measure(&gray_view(&target))?;
//! println!("overlay: {:.4} x {:.4} px", result.error_px.x, result.error_px.y);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `boxmark::core`: images, rectangles, mark geometry, filters, logger.
//! - `boxmark::edge`: profile extraction and sub-pixel edge models.
//! - `boxmark::coarse`: correlation, RMS-profile and detector-based coarse search.
//! - `boxmark::overlay`: fine locator, pipeline, results, JSON config and report.
//! - `boxmark::sim`: synthetic mark renderer.
//! - `boxmark::measure` (feature `image`): end-to-end helpers from image files.

pub use boxmark_coarse as coarse;
pub use boxmark_core as core;
pub use boxmark_edge as edge;
pub use boxmark_overlay as overlay;
pub use boxmark_sim as sim;

pub use boxmark_coarse::{BoxDetector, CoarseParams, CoarseStrategy, Detection};
pub use boxmark_core::{Axis, BoxGeometry, GrayImage, GrayImageView, Rect};
pub use boxmark_edge::{EdgeModel, EdgeModelKind};
pub use boxmark_overlay::{
    OverlayConfig, OverlayError, OverlayParams, OverlayPipeline, OverlayReport, OverlayResult,
    OverlayStats, PixelScale,
};

#[cfg(feature = "image")]
pub mod measure;
