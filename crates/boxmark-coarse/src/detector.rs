//! Adapter for external bounding-box detectors.

use boxmark_core::{CoarseEdges, GrayImageView, Rect};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::CoarseError;

/// One box reported by a detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    pub class_id: u32,
    pub confidence: f32,
}

/// Any object detector able to report axis-aligned boxes in an image.
pub trait BoxDetector: Send + Sync {
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<Detection>;
}

impl<F> BoxDetector for F
where
    F: Fn(&GrayImageView<'_>) -> Vec<Detection> + Send + Sync,
{
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<Detection> {
        self(image)
    }
}

/// Interpret the two largest detections as the outer and inner box.
///
/// Detections are ordered by area, largest first; ties keep detector order.
/// Class ids and confidences are not used.
pub fn coarse_edges_from_detections(detections: &[Detection]) -> Result<CoarseEdges, CoarseError> {
    if detections.len() < 2 {
        return Err(CoarseError::InsufficientDetections {
            found: detections.len(),
        });
    }
    let mut by_area: Vec<&Detection> = detections.iter().collect();
    by_area.sort_by_key(|d| std::cmp::Reverse(d.rect.area()));
    let (outer, inner) = (by_area[0].rect, by_area[1].rect);

    let edges = CoarseEdges::from_boxes(outer, inner);
    if !(edges.x.is_nested() && edges.y.is_nested()) {
        warn!("detected boxes do not nest: outer {outer:?}, inner {inner:?}");
    }
    Ok(edges)
}
