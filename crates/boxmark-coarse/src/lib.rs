//! Coarse, pixel-level localization of box-in-box overlay marks.
//!
//! Three strategies produce the same [`CoarseEdges`](boxmark_core::CoarseEdges):
//!
//! - normalized cross-correlation of a reference patch ([`NccTemplate`]),
//!   with edges derived from the nominal [`BoxGeometry`](boxmark_core::BoxGeometry);
//! - RMS-gradient profiles matched by rank correlation ([`RmsTemplate`]);
//! - bounding boxes from an external [`BoxDetector`].
//!
//! [`CoarseLocator`] owns the chosen template or detector.

mod detector;
mod error;
mod locator;
mod ncc;
mod rms;

pub use detector::{coarse_edges_from_detections, BoxDetector, Detection};
pub use error::{CoarseError, TemplateMismatch};
pub use locator::{CoarseLocator, CoarseParams, CoarseStrategy};
pub use ncc::{CorrelationMatch, CorrelationParams, NccTemplate};
pub use rms::{find_peaks, rms_profile, spearman, RmsParams, RmsTemplate};
