//! Sub-pixel refinement of the eight mark edges.

use boxmark_core::{median_filter, Axis, CoarseEdges, EdgeId, FineEdges, GrayImageView, Rect};
use boxmark_edge::{
    dynamic_range, extract_profile, EdgeError, EdgeModel, EdgeModelKind, MomentParams,
    MIN_PROFILE_LEN,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::OverlayError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Measurement-region and profile settings of the fine stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineParams {
    /// ROI extent along the measurement axis, in pixels.
    pub roi_length: i32,
    /// ROI extent across the measurement axis, in pixels.
    pub roi_width: i32,
    /// Median kernel applied inside each ROI.
    pub median_kernel: usize,
    /// Minimum `max - min` of a profile, in gray levels.
    pub min_contrast: f64,
    pub model: EdgeModelKind,
    pub moment: MomentParams,
}

impl Default for FineParams {
    fn default() -> Self {
        Self {
            roi_length: 60,
            roi_width: 20,
            median_kernel: 5,
            min_contrast: 5.0,
            model: EdgeModelKind::Moment,
            moment: MomentParams::default(),
        }
    }
}

impl FineParams {
    /// Reject ROI sizes that cannot yield a profile for the edge model.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.roi_length < MIN_PROFILE_LEN as i32 || self.roi_width < 1 {
            return Err(OverlayError::InvalidRoi {
                length: self.roi_length,
                width: self.roi_width,
                min_length: MIN_PROFILE_LEN,
            });
        }
        Ok(())
    }
}

/// Refines coarse edge positions with a 1-D edge model.
///
/// Every edge is measured in a thin ROI centered on its coarse position
/// along the measurement axis and on the outer-box center across it.
pub struct FineLocator {
    params: FineParams,
    model: Box<dyn EdgeModel>,
}

impl FineLocator {
    pub fn new(params: FineParams) -> Self {
        let model = params.model.build(params.moment);
        Self { params, model }
    }

    /// Use a custom edge model instead of the one named in `params`.
    pub fn with_model(params: FineParams, model: Box<dyn EdgeModel>) -> Self {
        Self { params, model }
    }

    #[inline]
    pub fn params(&self) -> &FineParams {
        &self.params
    }

    #[inline]
    pub fn model(&self) -> &dyn EdgeModel {
        self.model.as_ref()
    }

    /// Measurement region of one edge, before clipping.
    pub fn roi_for(&self, coarse: &CoarseEdges, edge: EdgeId) -> Rect {
        let mid = coarse.outer_midpoint();
        let across = match edge.axis {
            Axis::X => mid.y,
            Axis::Y => mid.x,
        };
        Rect::oriented(
            edge.axis,
            coarse.get(edge),
            across,
            self.params.roi_length,
            self.params.roi_width,
        )
    }

    /// Sub-pixel image coordinate of one edge.
    pub fn locate_edge(
        &self,
        image: &GrayImageView<'_>,
        coarse: &CoarseEdges,
        edge: EdgeId,
    ) -> Result<f64, EdgeError> {
        let roi = self.roi_for(coarse, edge).clip_to(image.bounds());
        let patch = image.crop(roi).ok_or(EdgeError::EmptyRoi)?;
        let filtered = median_filter(&patch.view(), self.params.median_kernel);
        let view = filtered.view();
        let profile = extract_profile(&view, view.bounds(), edge.axis).ok_or(EdgeError::EmptyRoi)?;

        let range = dynamic_range(&profile);
        if range < self.params.min_contrast {
            return Err(EdgeError::LowContrast {
                range,
                min: self.params.min_contrast,
            });
        }
        let estimate = self.model.estimate(&profile)?;
        Ok(roi.origin(edge.axis) as f64 + estimate.position)
    }

    /// Refine all eight edges. Any failure invalidates the whole set.
    ///
    /// Invalid ROI settings fail with [`OverlayError::InvalidRoi`] before any
    /// edge is measured.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, coarse), fields(model = self.model.name()))
    )]
    pub fn refine(
        &self,
        image: &GrayImageView<'_>,
        coarse: &CoarseEdges,
    ) -> Result<FineEdges, OverlayError> {
        self.params.validate()?;
        let mut fine = coarse.map(f64::from);
        let mut failures = Vec::new();
        for edge in EdgeId::all() {
            match self.locate_edge(image, coarse, edge) {
                Ok(pos) => *fine.get_mut(edge) = pos,
                Err(reason) => {
                    debug!("edge {edge} failed: {reason}");
                    failures.push((edge, reason));
                }
            }
        }
        if failures.is_empty() {
            Ok(fine)
        } else {
            let succeeded = 8 - failures.len();
            Err(OverlayError::from_edge_failures(failures, succeeded))
        }
    }
}

impl std::fmt::Debug for FineLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FineLocator")
            .field("params", &self.params)
            .field("model", &self.model.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use boxmark_core::{BoxGeometry, EdgeRole, GrayImage};
    use boxmark_edge::SubpixelEdge;
    use nalgebra::Point2;

    /// Sharp mark: outer frame 20, everything else 128, outer box spans
    /// pixels `[c - 100, c + 100)`.
    fn sharp_mark(n: usize, c: usize) -> GrayImage {
        let mut img = GrayImage::filled(n, n, 128);
        for y in c - 100..c + 100 {
            for x in c - 100..c + 100 {
                let inner = (c - 50..c + 50).contains(&x) && (c - 50..c + 50).contains(&y);
                if !inner {
                    img.set(x, y, 20);
                }
            }
        }
        img
    }

    fn nominal(c: i32) -> CoarseEdges {
        BoxGeometry::default().edges_around(Point2::new(c, c))
    }

    #[test]
    fn roi_is_centered_on_edge_and_outer_midline() {
        let fine = FineLocator::new(FineParams::default());
        let coarse = nominal(320);
        let id = EdgeId {
            axis: Axis::X,
            role: EdgeRole::InnerEnd,
        };
        assert_eq!(fine.roi_for(&coarse, id), Rect::new(340, 310, 60, 20));
        let id = EdgeId {
            axis: Axis::Y,
            role: EdgeRole::OuterStart,
        };
        assert_eq!(fine.roi_for(&coarse, id), Rect::new(310, 190, 20, 60));
    }

    #[test]
    fn sharp_edges_land_between_pixels() {
        let img = sharp_mark(640, 320);
        let fine = FineLocator::new(FineParams::default());
        let edges = fine.refine(&img.view(), &nominal(320)).unwrap();
        assert_abs_diff_eq!(edges.x.outer_start, 219.5, epsilon = 1e-9);
        assert_abs_diff_eq!(edges.x.inner_end, 369.5, epsilon = 1e-9);
        assert_abs_diff_eq!(edges.y.outer_end, 419.5, epsilon = 1e-9);
        let e = edges.overlay();
        assert_abs_diff_eq!(e.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(e.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_image_reports_low_contrast() {
        let img = GrayImage::filled(640, 640, 90);
        let fine = FineLocator::new(FineParams::default());
        match fine.refine(&img.view(), &nominal(320)) {
            Err(OverlayError::DegenerateProfile { edge, reason }) => {
                assert_eq!(edge.to_string(), "outer-left");
                assert!(matches!(reason, EdgeError::LowContrast { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edges_outside_image_are_out_of_bounds() {
        let img = sharp_mark(640, 320);
        let fine = FineLocator::new(FineParams::default());
        assert_eq!(
            fine.refine(&img.view(), &nominal(2000)),
            Err(OverlayError::OutOfBounds)
        );
    }

    #[test]
    fn partially_visible_mark_lists_failed_edges() {
        // Cut the image at x = 360: the outer-right ROI is empty and the
        // inner-right profile is flat.
        let full = sharp_mark(640, 320);
        let img = full.view().crop(Rect::new(0, 0, 360, 640)).unwrap();
        let fine = FineLocator::new(FineParams::default());
        match fine.refine(&img.view(), &nominal(320)) {
            Err(OverlayError::PartialFailure { failures }) => {
                let names: Vec<String> = failures.iter().map(|(id, _)| id.to_string()).collect();
                assert_eq!(names, vec!["inner-right", "outer-right"]);
                assert_eq!(failures[1].1, EdgeError::EmptyRoi);
                assert!(matches!(failures[0].1, EdgeError::LowContrast { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn degenerate_roi_is_a_configuration_error() {
        let img = sharp_mark(640, 320);
        for (length, width) in [(60, 0), (4, 20), (-10, 20)] {
            let params = FineParams {
                roi_length: length,
                roi_width: width,
                ..FineParams::default()
            };
            let expected = OverlayError::InvalidRoi {
                length,
                width,
                min_length: MIN_PROFILE_LEN,
            };
            assert_eq!(params.validate(), Err(expected.clone()));
            let fine = FineLocator::new(params);
            assert_eq!(fine.refine(&img.view(), &nominal(320)), Err(expected));
        }
        let smallest = FineParams {
            roi_length: MIN_PROFILE_LEN as i32,
            roi_width: 1,
            ..FineParams::default()
        };
        assert_eq!(smallest.validate(), Ok(()));
    }

    struct Fixed(f64);

    impl EdgeModel for Fixed {
        fn estimate(&self, _profile: &[f64]) -> Result<SubpixelEdge, EdgeError> {
            Ok(SubpixelEdge {
                position: self.0,
                peak_index: 0,
                peak_gradient: 1.0,
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn custom_model_is_used() {
        let img = sharp_mark(640, 320);
        let fine = FineLocator::with_model(FineParams::default(), Box::new(Fixed(30.0)));
        assert_eq!(fine.model().name(), "fixed");
        let edges = fine.refine(&img.view(), &nominal(320)).unwrap();
        assert_abs_diff_eq!(edges.x.outer_start, 220.0);
        assert_abs_diff_eq!(edges.y.inner_start, 270.0);
    }
}
