//! Normalized cross-correlation template search.
//!
//! The template is stored zero-mean at every pyramid level. Window sums of
//! the searched image come from integral images, so each candidate costs one
//! dot product. The coarsest level is searched exhaustively; finer levels
//! only re-search a small neighbourhood of the upsampled best position.

use boxmark_core::{downsample_2x, Axis, GrayImage, GrayImageView, Rect};
use log::debug;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::TemplateMismatch;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pyramid levels are only built while the template stays this large.
const MIN_LEVEL_SIZE: usize = 16;

const EPS: f64 = 1e-9;

/// Parameters of the correlation search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationParams {
    /// Number of 2x downsampling steps above full resolution.
    pub pyramid_levels: u32,
    /// Re-search radius at each finer level, in pixels of that level.
    pub refine_radius: i32,
    /// Minimum NCC score accepted at full resolution.
    pub min_score: f64,
    /// Restrict the search to this region of the image.
    pub search_region: Option<Rect>,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        Self {
            pyramid_levels: 2,
            refine_radius: 2,
            min_score: 0.5,
            search_region: None,
        }
    }
}

/// Best template placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatch {
    /// Image position of the template's top-left pixel.
    pub anchor: Point2<i32>,
    /// NCC score in `[-1, 1]`.
    pub score: f64,
}

#[derive(Clone, Debug)]
struct TemplateLevel {
    width: usize,
    height: usize,
    /// Zero-mean template samples, row-major.
    values: Vec<f64>,
    /// `sqrt(sum(values^2))`.
    norm: f64,
}

impl TemplateLevel {
    fn from_view(view: &GrayImageView<'_>) -> Option<Self> {
        let n = view.data.len() as f64;
        let mean = view.data.iter().map(|&v| v as f64).sum::<f64>() / n;
        let values: Vec<f64> = view.data.iter().map(|&v| v as f64 - mean).collect();
        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        (norm > EPS).then_some(Self {
            width: view.width,
            height: view.height,
            values,
            norm,
        })
    }
}

/// Zero-mean template with a precomputed pyramid.
#[derive(Clone, Debug)]
pub struct NccTemplate {
    levels: Vec<TemplateLevel>,
}

impl NccTemplate {
    /// Build a template from an image patch, with up to `pyramid_levels`
    /// coarser copies.
    pub fn new(patch: &GrayImageView<'_>, pyramid_levels: u32) -> Result<Self, TemplateMismatch> {
        if patch.width == 0 || patch.height == 0 {
            return Err(TemplateMismatch::EmptyTemplate);
        }
        let base = TemplateLevel::from_view(patch).ok_or(TemplateMismatch::FlatTemplate)?;
        let mut levels = vec![base];

        let mut current: GrayImage = patch.to_owned_image();
        for _ in 0..pyramid_levels {
            if current.width / 2 < MIN_LEVEL_SIZE || current.height / 2 < MIN_LEVEL_SIZE {
                break;
            }
            current = downsample_2x(&current.view());
            match TemplateLevel::from_view(&current.view()) {
                Some(level) => levels.push(level),
                None => break,
            }
        }
        Ok(Self { levels })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.levels[0].width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.levels[0].height
    }

    /// Pixel offset of the template center from its top-left corner.
    #[inline]
    pub fn center(&self) -> Vector2<i32> {
        Vector2::new(self.width() as i32 / 2, self.height() as i32 / 2)
    }

    /// Number of pyramid levels above full resolution.
    #[inline]
    pub fn pyramid_depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Locate the best placement of the template in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image, params), fields(width = image.width, height = image.height))
    )]
    pub fn find(
        &self,
        image: &GrayImageView<'_>,
        params: &CorrelationParams,
    ) -> Result<CorrelationMatch, TemplateMismatch> {
        let region = params
            .search_region
            .map(|r| r.clip_to(image.bounds()))
            .unwrap_or_else(|| image.bounds());
        check_extent(Axis::X, region.width.max(0) as usize, self.width())?;
        check_extent(Axis::Y, region.height.max(0) as usize, self.height())?;

        let cropped;
        let base = if region == image.bounds() {
            *image
        } else {
            cropped = image.crop(region).ok_or(TemplateMismatch::SearchAreaTooSmall {
                axis: Axis::X,
                search: 0,
                template: self.width(),
            })?;
            cropped.view()
        };

        let mut pyramid: Vec<GrayImage> = Vec::new();
        let mut depth = 0;
        for level in self.levels.iter().skip(1) {
            let src = pyramid.last().map(|img| img.view()).unwrap_or(base);
            if src.width / 2 < level.width || src.height / 2 < level.height {
                break;
            }
            let next = downsample_2x(&src);
            pyramid.push(next);
            depth += 1;
        }

        let level_view = |l: usize| if l == 0 { base } else { pyramid[l - 1].view() };

        let coarse = Integral::new(&level_view(depth));
        let tpl = &self.levels[depth];
        let mut best = exhaustive(&level_view(depth), &coarse, tpl);
        debug!(
            "ncc level {depth}: best ({}, {}) score {:.3}",
            best.0.x, best.0.y, best.1
        );

        for l in (0..depth).rev() {
            let view = level_view(l);
            let integral = Integral::new(&view);
            let tpl = &self.levels[l];
            let guess = best.0 * 2;
            best = local(&view, &integral, tpl, guess, params.refine_radius);
        }

        let (pos, score) = best;
        if score < params.min_score {
            return Err(TemplateMismatch::WeakCorrelation {
                score,
                min: params.min_score,
            });
        }
        Ok(CorrelationMatch {
            anchor: Point2::new(pos.x + region.x, pos.y + region.y),
            score,
        })
    }
}

fn check_extent(axis: Axis, search: usize, template: usize) -> Result<(), TemplateMismatch> {
    if search < template {
        return Err(TemplateMismatch::SearchAreaTooSmall {
            axis,
            search,
            template,
        });
    }
    Ok(())
}

/// Summed-area tables of pixel values and squared values.
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl Integral {
    fn new(view: &GrayImageView<'_>) -> Self {
        let stride = view.width + 1;
        let mut sum = vec![0u64; stride * (view.height + 1)];
        let mut sum_sq = vec![0u64; stride * (view.height + 1)];
        for y in 0..view.height {
            let (mut row_s, mut row_q) = (0u64, 0u64);
            for (x, &v) in view.row(y).iter().enumerate() {
                row_s += v as u64;
                row_q += (v as u64) * (v as u64);
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row_s;
                sum_sq[i] = sum_sq[i - stride] + row_q;
            }
        }
        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    #[inline]
    fn window(&self, table: &[u64], x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        let a = table[y * s + x];
        let b = table[y * s + x + w];
        let c = table[(y + h) * s + x];
        let d = table[(y + h) * s + x + w];
        (d + a - b - c) as f64
    }
}

fn score_at(
    view: &GrayImageView<'_>,
    integral: &Integral,
    tpl: &TemplateLevel,
    x: usize,
    y: usize,
) -> f64 {
    let (w, h) = (tpl.width, tpl.height);
    let n = (w * h) as f64;
    let s = integral.window(&integral.sum, x, y, w, h);
    let q = integral.window(&integral.sum_sq, x, y, w, h);
    let var = q - s * s / n;
    if var <= EPS {
        return 0.0;
    }

    let mut dot = 0.0;
    for ty in 0..h {
        let row = &view.row(y + ty)[x..x + w];
        let trow = &tpl.values[ty * w..(ty + 1) * w];
        dot += row
            .iter()
            .zip(trow)
            .map(|(&p, &t)| p as f64 * t)
            .sum::<f64>();
    }
    dot / (tpl.norm * var.sqrt())
}

fn exhaustive(
    view: &GrayImageView<'_>,
    integral: &Integral,
    tpl: &TemplateLevel,
) -> (Vector2<i32>, f64) {
    let mut best = (Vector2::zeros(), f64::NEG_INFINITY);
    for y in 0..=view.height - tpl.height {
        for x in 0..=view.width - tpl.width {
            let s = score_at(view, integral, tpl, x, y);
            if s > best.1 {
                best = (Vector2::new(x as i32, y as i32), s);
            }
        }
    }
    best
}

fn local(
    view: &GrayImageView<'_>,
    integral: &Integral,
    tpl: &TemplateLevel,
    guess: Vector2<i32>,
    radius: i32,
) -> (Vector2<i32>, f64) {
    let max_x = (view.width - tpl.width) as i32;
    let max_y = (view.height - tpl.height) as i32;
    let mut best = (guess.map(|v| v.max(0)), f64::NEG_INFINITY);
    for y in (guess.y - radius).max(0)..=(guess.y + radius).min(max_y) {
        for x in (guess.x - radius).max(0)..=(guess.x + radius).min(max_x) {
            let s = score_at(view, integral, tpl, x as usize, y as usize);
            if s > best.1 {
                best = (Vector2::new(x, y), s);
            }
        }
    }
    best
}
