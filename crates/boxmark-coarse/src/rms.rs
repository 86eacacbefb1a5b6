//! RMS-gradient profile template.
//!
//! Each axis of the preprocessed image is reduced to the RMS of its Sobel
//! derivative per column (X) or row (Y). The four box edges show up as the
//! four strongest peaks. The template keeps the profile window around those
//! peaks; matching slides it over a new profile with Spearman rank
//! correlation and re-picks the peaks inside the best window.

use boxmark_core::{sobel, Axis, AxisEdges, FilterChain, GrayImageView, Preprocessor};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::TemplateMismatch;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the RMS-gradient strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmsParams {
    /// Minimum distance between accepted peaks, in pixels.
    ///
    /// Must stay below the nominal outer-to-inner edge gap (50 px for the
    /// default 200/100 mark) or the inner edge next to an outer one is
    /// suppressed. The default of 40 leaves 10 px of slack for scale changes.
    pub min_peak_separation: usize,
    /// Samples kept on each side of the outermost peaks.
    pub margin: usize,
    /// Applied to both the reference and the searched image. Equalization is
    /// off by default: it quantizes the blurred edge ramps into a few levels,
    /// which moves the RMS peaks by several pixels and flattens the profile
    /// the rank correlation has to match.
    pub preprocess: FilterChain,
}

impl Default for RmsParams {
    fn default() -> Self {
        Self {
            min_peak_separation: 40,
            margin: 15,
            preprocess: FilterChain {
                median_kernel: 3,
                equalize: false,
            },
        }
    }
}

/// RMS of the derivative along `axis`, one value per column (X) or row (Y).
pub fn rms_profile(image: &GrayImageView<'_>, axis: Axis) -> Vec<f64> {
    let grad = sobel(image, axis);
    let (w, h) = (image.width, image.height);
    match axis {
        Axis::X => {
            let mut acc = vec![0.0f64; w];
            for row in grad.chunks_exact(w.max(1)) {
                for (a, &g) in acc.iter_mut().zip(row) {
                    *a += (g as f64) * (g as f64);
                }
            }
            acc.into_iter().map(|s| (s / h as f64).sqrt()).collect()
        }
        Axis::Y => grad
            .chunks_exact(w.max(1))
            .map(|row| {
                let s: f64 = row.iter().map(|&g| (g as f64) * (g as f64)).sum();
                (s / w as f64).sqrt()
            })
            .collect(),
    }
}

/// Up to `max_count` local maxima, strongest first, at least `min_separation`
/// apart; returned in ascending index order.
///
/// A sample is a local maximum when it is positive, strictly above its left
/// neighbour and not below its right neighbour, so a two-sample plateau
/// yields its left sample.
pub fn find_peaks(sequence: &[f64], min_separation: usize, max_count: usize) -> Vec<usize> {
    let n = sequence.len();
    if n < 3 {
        return Vec::new();
    }
    let mut candidates: Vec<usize> = (1..n - 1)
        .filter(|&i| {
            let v = sequence[i];
            v > 0.0 && v > sequence[i - 1] && v >= sequence[i + 1]
        })
        .collect();
    candidates.sort_by(|&a, &b| sequence[b].total_cmp(&sequence[a]));

    let mut accepted: Vec<usize> = Vec::with_capacity(max_count);
    for i in candidates {
        if accepted.len() == max_count {
            break;
        }
        if accepted.iter().all(|&j| i.abs_diff(j) >= min_separation) {
            accepted.push(i);
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Ranks starting at 1, ties share their average rank.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = 0.5 * (i + j) as f64 + 1.0;
        for &k in &order[i..=j] {
            out[k] = rank;
        }
        i = j + 1;
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        sab += (x - ma) * (y - mb);
        saa += (x - ma) * (x - ma);
        sbb += (y - mb) * (y - mb);
    }
    if saa <= 0.0 || sbb <= 0.0 {
        return 0.0;
    }
    sab / (saa * sbb).sqrt()
}

/// Spearman rank correlation of two equally long sequences.
///
/// Constant or empty input correlates as zero.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    pearson(&ranks(a), &ranks(b))
}

#[derive(Clone, Debug)]
struct AxisTemplate {
    window: Vec<f64>,
}

/// Stored RMS profile windows for both axes.
#[derive(Clone, Debug)]
pub struct RmsTemplate {
    params: RmsParams,
    x: AxisTemplate,
    y: AxisTemplate,
}

impl RmsTemplate {
    /// Build the template from a reference image of a mark.
    pub fn new(reference: &GrayImageView<'_>, params: RmsParams) -> Result<Self, TemplateMismatch> {
        let processed = params.preprocess.preprocess(reference);
        let view = processed.view();
        let build = |axis: Axis| -> Result<AxisTemplate, TemplateMismatch> {
            let profile = rms_profile(&view, axis);
            let peaks = find_peaks(&profile, params.min_peak_separation, 4);
            if peaks.len() < 4 {
                return Err(TemplateMismatch::PeaksNotFound {
                    axis,
                    found: peaks.len(),
                });
            }
            let lo = peaks[0].saturating_sub(params.margin);
            let hi = (peaks[3] + params.margin).min(profile.len() - 1);
            debug!("rms template {axis:?}: peaks {peaks:?}, window {lo}..={hi}");
            Ok(AxisTemplate {
                window: profile[lo..=hi].to_vec(),
            })
        };
        Ok(Self {
            params,
            x: build(Axis::X)?,
            y: build(Axis::Y)?,
        })
    }

    #[inline]
    pub fn params(&self) -> &RmsParams {
        &self.params
    }

    /// Length of the stored window along `axis`.
    pub fn window_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.x.window.len(),
            Axis::Y => self.y.window.len(),
        }
    }

    /// Locate the four edges along each axis.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn locate(
        &self,
        image: &GrayImageView<'_>,
    ) -> Result<(AxisEdges<i32>, AxisEdges<i32>), TemplateMismatch> {
        let processed = self.params.preprocess.preprocess(image);
        let view = processed.view();
        Ok((
            self.locate_axis(&view, Axis::X, &self.x)?,
            self.locate_axis(&view, Axis::Y, &self.y)?,
        ))
    }

    fn locate_axis(
        &self,
        view: &GrayImageView<'_>,
        axis: Axis,
        template: &AxisTemplate,
    ) -> Result<AxisEdges<i32>, TemplateMismatch> {
        let profile = rms_profile(view, axis);
        let len = template.window.len();
        if profile.len() < len {
            return Err(TemplateMismatch::SearchAreaTooSmall {
                axis,
                search: profile.len(),
                template: len,
            });
        }

        let (offset, score) = (0..=profile.len() - len)
            .map(|s| (s, spearman(&template.window, &profile[s..s + len])))
            .fold((0, f64::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });

        let peaks = find_peaks(
            &profile[offset..offset + len],
            self.params.min_peak_separation,
            4,
        );
        if peaks.len() < 4 {
            return Err(TemplateMismatch::PeaksNotFound {
                axis,
                found: peaks.len(),
            });
        }
        debug!("rms match {axis:?}: offset {offset}, rho {score:.3}, peaks {peaks:?}");
        let at = |k: usize| (offset + peaks[k]) as i32;
        Ok(AxisEdges {
            outer_start: at(0),
            inner_start: at(1),
            inner_end: at(2),
            outer_end: at(3),
        })
    }
}
