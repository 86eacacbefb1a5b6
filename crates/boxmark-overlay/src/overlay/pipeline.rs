use boxmark_coarse::{BoxDetector, CoarseLocator, TemplateMismatch};
use boxmark_core::{Axis, GrayImageView, Rect};
use boxmark_edge::EdgeModel;
use log::debug;

use super::{OverlayError, OverlayParams, OverlayResult};
use crate::FineLocator;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Lifecycle of an [`OverlayPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// No template or detector yet; measurements fail.
    Uninitialized,
    /// Coarse stage ready. This is also the measuring state: `measure` only
    /// borrows the pipeline, so it never leaves `TemplateReady` and
    /// measurements may run repeatedly or concurrently.
    TemplateReady,
}

/// Coarse-to-fine overlay measurement.
///
/// Initialization mutates the pipeline; measuring only borrows it, so one
/// initialized pipeline can serve many threads.
#[derive(Debug)]
pub struct OverlayPipeline {
    params: OverlayParams,
    coarse: CoarseLocator,
    fine: FineLocator,
}

impl OverlayPipeline {
    pub fn new(params: OverlayParams) -> Self {
        Self {
            coarse: CoarseLocator::new(params.coarse),
            fine: FineLocator::new(params.fine),
            params,
        }
    }

    /// Attach the detector used by the detector strategy.
    pub fn with_detector(mut self, detector: Box<dyn BoxDetector>) -> Self {
        self.coarse.set_detector(detector);
        self
    }

    /// Replace the edge model selected in the fine parameters.
    pub fn with_edge_model(mut self, model: Box<dyn EdgeModel>) -> Self {
        self.fine = FineLocator::with_model(self.params.fine, model);
        self
    }

    #[inline]
    pub fn params(&self) -> &OverlayParams {
        &self.params
    }

    pub fn state(&self) -> PipelineState {
        if self.coarse.is_ready() {
            PipelineState::TemplateReady
        } else {
            PipelineState::Uninitialized
        }
    }

    /// Build the coarse template from a reference image.
    ///
    /// `roi` is the region of the reference holding the mark (`None` for the
    /// whole image). Calling this again replaces the template.
    pub fn initialize_template(
        &mut self,
        reference: &GrayImageView<'_>,
        roi: Option<Rect>,
    ) -> Result<(), OverlayError> {
        self.coarse.initialize(reference, roi)?;
        Ok(())
    }

    /// Measure the overlay error of the mark in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn measure(&self, image: &GrayImageView<'_>) -> Result<OverlayResult, OverlayError> {
        if self.state() == PipelineState::Uninitialized {
            return Err(TemplateMismatch::NotInitialized.into());
        }

        let coarse = self.coarse.locate(image)?;
        let outer = coarse.outer_rect();
        if !outer.is_empty() && outer.clip_to(image.bounds()).is_empty() {
            return Err(OverlayError::OutOfBounds);
        }
        debug!("coarse edges x {:?} y {:?}", coarse.x, coarse.y);

        let fine = self.fine.refine(image, &coarse)?;
        if self.params.validate_nesting {
            for axis in Axis::BOTH {
                if !fine.axis(axis).is_nested() {
                    return Err(OverlayError::InconsistentEdges { axis });
                }
            }
        }

        let error_px = fine.overlay();
        debug!("overlay error ({:.4}, {:.4}) px", error_px.x, error_px.y);
        Ok(OverlayResult {
            error_px,
            error_physical: self.params.scale.to_physical(error_px),
            outer_center: fine.outer_center(),
            inner_center: fine.inner_center(),
            fine,
            coarse,
        })
    }

    /// Measure every image, in parallel with the `rayon` feature.
    ///
    /// Results keep the order of `images`.
    pub fn measure_batch(
        &self,
        images: &[GrayImageView<'_>],
    ) -> Vec<Result<OverlayResult, OverlayError>> {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            images.par_iter().map(|img| self.measure(img)).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            images.iter().map(|img| self.measure(img)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn pipeline_is_shareable_across_threads() {
        assert_send_sync::<OverlayPipeline>();
    }

    #[test]
    fn new_pipeline_is_uninitialized() {
        let pipeline = OverlayPipeline::new(OverlayParams::default());
        assert_eq!(pipeline.state(), PipelineState::Uninitialized);
        let img = boxmark_core::GrayImage::filled(64, 64, 0);
        assert_eq!(
            pipeline.measure(&img.view()),
            Err(OverlayError::TemplateMismatch(TemplateMismatch::NotInitialized))
        );
    }
}
