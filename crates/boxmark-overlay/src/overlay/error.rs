use boxmark_coarse::{CoarseError, TemplateMismatch};
use boxmark_core::{Axis, EdgeId};
use boxmark_edge::EdgeError;

/// Errors returned by the overlay pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    #[error("detector returned {found} boxes, need an outer and an inner box")]
    InsufficientDetections { found: usize },
    #[error("coarse template mismatch: {0}")]
    TemplateMismatch(TemplateMismatch),
    #[error("degenerate profile at {edge}: {reason}")]
    DegenerateProfile { edge: EdgeId, reason: EdgeError },
    #[error("mark lies outside the image")]
    OutOfBounds,
    #[error("{} of 8 edges failed", .failures.len())]
    PartialFailure { failures: Vec<(EdgeId, EdgeError)> },
    #[error("refined edges along {axis:?} are not nested")]
    InconsistentEdges { axis: Axis },
    #[error("fine ROI of {length}x{width} px is too small (need length >= {min_length}, width >= 1)")]
    InvalidRoi {
        length: i32,
        width: i32,
        min_length: usize,
    },
}

impl From<CoarseError> for OverlayError {
    fn from(err: CoarseError) -> Self {
        match err {
            CoarseError::InsufficientDetections { found } => {
                OverlayError::InsufficientDetections { found }
            }
            CoarseError::TemplateMismatch(m) => OverlayError::TemplateMismatch(m),
        }
    }
}

impl From<TemplateMismatch> for OverlayError {
    fn from(err: TemplateMismatch) -> Self {
        OverlayError::TemplateMismatch(err)
    }
}

impl OverlayError {
    /// Fold per-edge failures into a single error.
    ///
    /// `succeeded` is the number of edges that were localized. With no
    /// successes, an all-empty set of regions means the mark is outside the
    /// image; otherwise the first failure is reported as a degenerate profile.
    pub fn from_edge_failures(failures: Vec<(EdgeId, EdgeError)>, succeeded: usize) -> Self {
        if succeeded > 0 {
            return OverlayError::PartialFailure { failures };
        }
        if failures.iter().all(|(_, e)| *e == EdgeError::EmptyRoi) {
            return OverlayError::OutOfBounds;
        }
        match failures.into_iter().find(|(_, e)| *e != EdgeError::EmptyRoi) {
            Some((edge, reason)) => OverlayError::DegenerateProfile { edge, reason },
            None => OverlayError::OutOfBounds,
        }
    }
}
