//! Sub-pixel edge models.
//!
//! An [`EdgeModel`] turns a 1-D profile across a single edge into the
//! sub-pixel position of that edge, measured in samples from the profile
//! start. The gradient-centroid ([`MomentModel`]) is the reference estimator.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::EdgeError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Shortest profile any model accepts.
pub const MIN_PROFILE_LEN: usize = 5;

const MIN_WEIGHT: f64 = 1e-6;

/// Sub-pixel edge location within a profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubpixelEdge {
    /// Position in samples from the start of the profile.
    pub position: f64,
    /// Index of the strongest gradient sample.
    pub peak_index: usize,
    /// Gradient magnitude at `peak_index`.
    pub peak_gradient: f64,
}

/// Strategy that localizes the dominant edge of a profile.
pub trait EdgeModel: Send + Sync {
    fn estimate(&self, profile: &[f64]) -> Result<SubpixelEdge, EdgeError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Tuning of the gradient-centroid estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentParams {
    /// Fraction of the peak gradient subtracted from every sample.
    pub threshold_frac: f64,
    /// Half-width of the centroid window around the peak, in samples.
    pub half_window: usize,
}

impl Default for MomentParams {
    fn default() -> Self {
        Self {
            threshold_frac: 0.3,
            half_window: 5,
        }
    }
}

/// Gradient-centroid (first spatial moment) edge estimator.
#[derive(Clone, Debug, Default)]
pub struct MomentModel {
    params: MomentParams,
}

impl MomentModel {
    pub fn new(params: MomentParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &MomentParams {
        &self.params
    }
}

impl EdgeModel for MomentModel {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, profile), fields(len = profile.len()))
    )]
    fn estimate(&self, profile: &[f64]) -> Result<SubpixelEdge, EdgeError> {
        let n = profile.len();
        if n < MIN_PROFILE_LEN {
            return Err(EdgeError::TooShort {
                len: n,
                min: MIN_PROFILE_LEN,
            });
        }

        let grad = central_gradient(profile);
        let (peak_index, peak_gradient) = grad
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, g)| {
                if g > best.1 {
                    (i, g)
                } else {
                    best
                }
            });

        let threshold = self.params.threshold_frac * peak_gradient;
        let lo = peak_index.saturating_sub(self.params.half_window).max(1);
        let hi = (peak_index + self.params.half_window).min(n - 1);

        let (mut sum_w, mut sum_wi) = (0.0f64, 0.0f64);
        for (i, &g) in grad.iter().enumerate().take(hi + 1).skip(lo) {
            if g > threshold {
                let w = g - threshold;
                sum_w += w;
                sum_wi += w * i as f64;
            }
        }

        if sum_w.abs() < MIN_WEIGHT {
            return Err(EdgeError::Flat);
        }

        Ok(SubpixelEdge {
            position: sum_wi / sum_w,
            peak_index,
            peak_gradient,
        })
    }

    fn name(&self) -> &'static str {
        "moment"
    }
}

/// Absolute central-difference gradient; both end samples are zero.
pub fn central_gradient(profile: &[f64]) -> Vec<f64> {
    let n = profile.len();
    let mut grad = vec![0.0; n];
    if n >= 3 {
        for i in 1..n - 1 {
            grad[i] = 0.5 * (profile[i + 1] - profile[i - 1]).abs();
        }
    }
    grad
}

/// Selectable edge-fitting strategy.
///
/// Only the moment estimator is implemented; the other selectors are accepted
/// in configurations and resolve to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeModelKind {
    #[default]
    Moment,
    Gaussian,
    Sigmoid,
    Quadratic,
}

impl EdgeModelKind {
    /// Instantiate the strategy behind this selector.
    pub fn build(self, moment: MomentParams) -> Box<dyn EdgeModel> {
        if self != EdgeModelKind::Moment {
            warn!("{self:?} edge model not available, using moment");
        }
        Box::new(MomentModel::new(moment))
    }
}
