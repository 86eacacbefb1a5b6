use boxmark_core::{BoxGeometry, CoarseEdges, EdgeSet, GrayImageView, Rect};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    coarse_edges_from_detections, BoxDetector, CoarseError, CorrelationParams, NccTemplate,
    RmsParams, RmsTemplate, TemplateMismatch,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How the coarse stage finds the mark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseStrategy {
    /// NCC search of a reference patch; edges follow from [`BoxGeometry`].
    #[default]
    Correlation,
    /// Sliding RMS-gradient profile template.
    RmsProfile,
    /// Outer and inner boxes from an external detector.
    Detector,
}

/// Parameters of the coarse stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarseParams {
    pub strategy: CoarseStrategy,
    pub geometry: BoxGeometry,
    pub correlation: CorrelationParams,
    pub rms: RmsParams,
}

#[derive(Clone, Debug)]
enum CoarseTemplate {
    Correlation(NccTemplate),
    Rms(RmsTemplate),
}

/// Pixel-level locator of the eight mark edges.
///
/// Template strategies need [`CoarseLocator::initialize`] before use; the
/// detector strategy needs a detector attached with
/// [`CoarseLocator::set_detector`]. Both are read-only afterwards.
pub struct CoarseLocator {
    params: CoarseParams,
    template: Option<CoarseTemplate>,
    detector: Option<Box<dyn BoxDetector>>,
}

impl CoarseLocator {
    pub fn new(params: CoarseParams) -> Self {
        Self {
            params,
            template: None,
            detector: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &CoarseParams {
        &self.params
    }

    pub fn set_detector(&mut self, detector: Box<dyn BoxDetector>) {
        self.detector = Some(detector);
    }

    pub fn with_detector(mut self, detector: Box<dyn BoxDetector>) -> Self {
        self.set_detector(detector);
        self
    }

    /// Whether [`CoarseLocator::locate`] can run with the current strategy.
    pub fn is_ready(&self) -> bool {
        match self.params.strategy {
            CoarseStrategy::Correlation => {
                matches!(self.template, Some(CoarseTemplate::Correlation(_)))
            }
            CoarseStrategy::RmsProfile => matches!(self.template, Some(CoarseTemplate::Rms(_))),
            CoarseStrategy::Detector => self.detector.is_some(),
        }
    }

    /// Build the template for the configured strategy from a reference image.
    ///
    /// `roi` selects the part of the reference holding the mark; `None` uses
    /// the whole image. Replaces any previous template.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, reference), fields(width = reference.width, height = reference.height))
    )]
    pub fn initialize(
        &mut self,
        reference: &GrayImageView<'_>,
        roi: Option<Rect>,
    ) -> Result<(), CoarseError> {
        let owned;
        let patch = match roi {
            Some(r) => {
                owned = reference.crop(r).ok_or(TemplateMismatch::EmptyTemplate)?;
                owned.view()
            }
            None => *reference,
        };

        self.template = match self.params.strategy {
            CoarseStrategy::Correlation => Some(CoarseTemplate::Correlation(NccTemplate::new(
                &patch,
                self.params.correlation.pyramid_levels,
            )?)),
            CoarseStrategy::RmsProfile => {
                Some(CoarseTemplate::Rms(RmsTemplate::new(&patch, self.params.rms)?))
            }
            CoarseStrategy::Detector => {
                if self.detector.is_none() {
                    return Err(TemplateMismatch::NotInitialized.into());
                }
                None
            }
        };
        debug!(
            "coarse template ready ({:?}, {}x{})",
            self.params.strategy, patch.width, patch.height
        );
        Ok(())
    }

    /// Pixel-level positions of the eight edges in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn locate(&self, image: &GrayImageView<'_>) -> Result<CoarseEdges, CoarseError> {
        match (self.params.strategy, &self.template) {
            (CoarseStrategy::Correlation, Some(CoarseTemplate::Correlation(tpl))) => {
                let m = tpl.find(image, &self.params.correlation)?;
                let center = m.anchor + tpl.center();
                debug!(
                    "correlation anchor ({}, {}) score {:.3}",
                    m.anchor.x, m.anchor.y, m.score
                );
                Ok(self.params.geometry.edges_around(center))
            }
            (CoarseStrategy::RmsProfile, Some(CoarseTemplate::Rms(tpl))) => {
                let (x, y) = tpl.locate(image)?;
                Ok(EdgeSet { x, y })
            }
            (CoarseStrategy::Detector, _) => {
                let detector = self
                    .detector
                    .as_ref()
                    .ok_or(TemplateMismatch::NotInitialized)?;
                coarse_edges_from_detections(&detector.detect(image))
            }
            _ => Err(TemplateMismatch::NotInitialized.into()),
        }
    }
}

impl std::fmt::Debug for CoarseLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoarseLocator")
            .field("params", &self.params)
            .field("template", &self.template)
            .field("has_detector", &self.detector.is_some())
            .finish()
    }
}
