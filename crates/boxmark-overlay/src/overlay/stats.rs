use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::{OverlayError, OverlayResult};

/// Summary of a batch of measurements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayStats {
    pub succeeded: usize,
    pub failed: usize,
    /// Mean pixel error over successful measurements.
    pub mean_px: Vector2<f64>,
    /// Sample variance per axis (zero with fewer than two successes).
    pub variance_px: Vector2<f64>,
}

impl Default for OverlayStats {
    fn default() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            mean_px: Vector2::zeros(),
            variance_px: Vector2::zeros(),
        }
    }
}

impl OverlayStats {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a Result<OverlayResult, OverlayError>>,
    {
        let mut errors: Vec<Vector2<f64>> = Vec::new();
        let mut failed = 0;
        for r in results {
            match r {
                Ok(res) => errors.push(res.error_px),
                Err(_) => failed += 1,
            }
        }

        let n = errors.len();
        let mut stats = Self {
            succeeded: n,
            failed,
            ..Self::default()
        };
        if n == 0 {
            return stats;
        }
        stats.mean_px = errors.iter().sum::<Vector2<f64>>() / n as f64;
        if n > 1 {
            let ss: Vector2<f64> = errors
                .iter()
                .map(|e| (e - stats.mean_px).component_mul(&(e - stats.mean_px)))
                .sum();
            stats.variance_px = ss / (n - 1) as f64;
        }
        stats
    }

    /// Per-axis sample standard deviation.
    pub fn std_px(&self) -> Vector2<f64> {
        self.variance_px.map(f64::sqrt)
    }
}
