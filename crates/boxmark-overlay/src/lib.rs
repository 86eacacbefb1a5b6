//! Sub-pixel box-in-box overlay measurement.
//!
//! [`OverlayPipeline`] chains the coarse locator from `boxmark-coarse` with
//! the [`FineLocator`], which refines each of the eight mark edges with a 1-D
//! edge model from `boxmark-edge`. The overlay error is the inner-box center
//! minus the outer-box center, reported in pixels and in physical units.
//!
//! ```no_run
//! use boxmark_core::{GrayImageView, Rect};
//! use boxmark_overlay::{OverlayParams, OverlayPipeline};
//!
//! # fn load() -> (Vec<u8>, Vec<u8>) { (vec![0; 640 * 640], vec![0; 640 * 640]) }
//! let (reference, target) = load();
//! let mut pipeline = OverlayPipeline::new(OverlayParams::default());
//! let reference = GrayImageView::try_new(640, 640, &reference).unwrap();
//! pipeline
//!     .initialize_template(&reference, Some(Rect::centered(320, 320, 240, 240)))
//!     .unwrap();
//! let target = GrayImageView::try_new(640, 640, &target).unwrap();
//! let result = pipeline.measure(&target).unwrap();
//! println!("overlay {:?} px", result.error_px);
//! ```

mod fine;
mod io;
mod overlay;

pub use fine::{FineLocator, FineParams};
pub use io::{ImageReport, OverlayConfig, OverlayIoError, OverlayReport};
pub use overlay::{
    OverlayError, OverlayParams, OverlayPipeline, OverlayResult, OverlayStats, PipelineState,
    PixelScale,
};
