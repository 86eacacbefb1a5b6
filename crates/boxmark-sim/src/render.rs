use boxmark_core::{convolve_separable, gaussian_kernel, BoxGeometry, GrayImage, Rect};
use nalgebra::{Point2, Rotation2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::noise::quantize_with_noise;

/// Appearance of the rendered mark and the imaging chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkParams {
    pub geometry: BoxGeometry,
    /// Gray level outside the outer box.
    pub background: u8,
    /// Gray level of the outer frame.
    pub outer_level: u8,
    /// Gray level inside the inner box.
    pub inner_level: u8,
    /// Sigma of the Gaussian point-spread function, in pixels.
    pub blur_sigma: f64,
    /// Total salt-and-pepper probability per pixel.
    pub salt_pepper: f64,
    /// Samples per pixel side for rotated marks.
    pub supersample: usize,
    pub seed: u64,
}

impl Default for MarkParams {
    fn default() -> Self {
        Self {
            geometry: BoxGeometry::default(),
            background: 128,
            outer_level: 20,
            inner_level: 128,
            blur_sigma: 1.0,
            salt_pepper: 0.0,
            supersample: 4,
            seed: 7,
        }
    }
}

/// Placement of one mark inside a square image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Side length of the square image.
    pub size: usize,
    /// Displacement of the inner box relative to the outer box, in the mark
    /// frame.
    pub shift: Vector2<f64>,
    /// Standard deviation of additive Gaussian noise, in gray levels.
    pub noise: f64,
    /// Rotation of the whole mark about the image center, in degrees.
    pub angle_deg: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            size: 640,
            shift: Vector2::zeros(),
            noise: 0.0,
            angle_deg: 0.0,
        }
    }
}

/// Rendered image plus its ground truth.
#[derive(Clone, Debug)]
pub struct SyntheticMark {
    pub image: GrayImage,
    /// Axis-aligned bounding box of the outer box, rounded to pixels.
    pub outer_box: Rect,
    /// Axis-aligned bounding box of the inner box, rounded to pixels.
    pub inner_box: Rect,
    /// True overlay (inner center minus outer center) in image axes.
    pub overlay: Vector2<f64>,
}

/// Renders box-in-box marks through a blur and noise model.
#[derive(Clone, Debug, Default)]
pub struct MarkRenderer {
    params: MarkParams,
}

impl MarkRenderer {
    pub fn new(params: MarkParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &MarkParams {
        &self.params
    }

    pub fn render(&self, scene: &Scene) -> SyntheticMark {
        let n = scene.size;
        let c = n as f64 / 2.0;
        let center = Point2::new(c, c);
        let rot = Rotation2::new(scene.angle_deg.to_radians());
        let half_outer = self.params.geometry.outer_size as f64 / 2.0;
        let half_inner = self.params.geometry.inner_size as f64 / 2.0;

        let (outer_cov, inner_cov) = if scene.angle_deg == 0.0 {
            axis_aligned_coverage(n, c, half_outer, half_inner, scene.shift)
        } else {
            rotated_coverage(
                n,
                center,
                &rot,
                half_outer,
                half_inner,
                scene.shift,
                self.params.supersample.max(1),
            )
        };

        let bg = self.params.background as f64;
        let outer = self.params.outer_level as f64;
        let inner = self.params.inner_level as f64;
        let mut buf: Vec<f64> = outer_cov
            .iter()
            .zip(&inner_cov)
            .map(|(&o, &i)| bg * (1.0 - o) + outer * (o - i) + inner * i)
            .collect();

        convolve_separable(&mut buf, n, n, &gaussian_kernel(self.params.blur_sigma));

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let data = quantize_with_noise(&buf, scene.noise, self.params.salt_pepper, &mut rng);

        let overlay = rot * scene.shift;
        SyntheticMark {
            image: GrayImage {
                width: n,
                height: n,
                data,
            },
            outer_box: rotated_box(center, &rot, Vector2::zeros(), half_outer),
            inner_box: rotated_box(center, &rot, scene.shift, half_inner),
            overlay,
        }
    }
}

/// Render a mark with default appearance.
///
/// `angle_deg` rotates the mark about the image center.
pub fn render_mark(size: usize, shift_x: f64, shift_y: f64, noise: f64, angle_deg: f64) -> GrayImage {
    MarkRenderer::default()
        .render(&Scene {
            size,
            shift: Vector2::new(shift_x, shift_y),
            noise,
            angle_deg,
        })
        .image
}

/// Fraction of pixel `[i, i + 1)` covered by the interval `[a, b)`.
fn coverage_1d(a: f64, b: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let lo = a.max(i as f64);
            let hi = b.min(i as f64 + 1.0);
            (hi - lo).max(0.0)
        })
        .collect()
}

fn axis_aligned_coverage(
    n: usize,
    c: f64,
    half_outer: f64,
    half_inner: f64,
    shift: Vector2<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let outer = coverage_1d(c - half_outer, c + half_outer, n);
    let inner_x = coverage_1d(c - half_inner + shift.x, c + half_inner + shift.x, n);
    let inner_y = coverage_1d(c - half_inner + shift.y, c + half_inner + shift.y, n);

    let mut o = Vec::with_capacity(n * n);
    let mut i = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            o.push(outer[x] * outer[y]);
            i.push(inner_x[x] * inner_y[y]);
        }
    }
    (o, i)
}

fn rotated_coverage(
    n: usize,
    center: Point2<f64>,
    rot: &Rotation2<f64>,
    half_outer: f64,
    half_inner: f64,
    shift: Vector2<f64>,
    ss: usize,
) -> (Vec<f64>, Vec<f64>) {
    let inv = rot.inverse();
    let step = 1.0 / ss as f64;
    let norm = 1.0 / (ss * ss) as f64;

    let mut o = Vec::with_capacity(n * n);
    let mut i = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let (mut hits_o, mut hits_i) = (0usize, 0usize);
            for sy in 0..ss {
                for sx in 0..ss {
                    let p = Point2::new(
                        x as f64 + (sx as f64 + 0.5) * step,
                        y as f64 + (sy as f64 + 0.5) * step,
                    );
                    let m = inv * (p - center);
                    if m.x.abs() < half_outer && m.y.abs() < half_outer {
                        hits_o += 1;
                        let d = m - shift;
                        if d.x.abs() < half_inner && d.y.abs() < half_inner {
                            hits_i += 1;
                        }
                    }
                }
            }
            o.push(hits_o as f64 * norm);
            i.push(hits_i as f64 * norm);
        }
    }
    (o, i)
}

/// Pixel bounding box of a square of half-size `half`, centered at
/// `offset` in the mark frame.
fn rotated_box(center: Point2<f64>, rot: &Rotation2<f64>, offset: Vector2<f64>, half: f64) -> Rect {
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .map(|(sx, sy)| center + rot * (offset + Vector2::new(sx * half, sy * half)));
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in corners {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    let (x0, y0) = (x0.round() as i32, y0.round() as i32);
    Rect::new(x0, y0, x1.round() as i32 - x0, y1.round() as i32 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sharp() -> MarkRenderer {
        MarkRenderer::new(MarkParams {
            blur_sigma: 0.0,
            ..MarkParams::default()
        })
    }

    #[test]
    fn centered_mark_has_expected_levels() {
        let mark = MarkRenderer::default().render(&Scene::default());
        let v = mark.image.view();
        assert_eq!((v.width, v.height), (640, 640));
        assert_eq!(v.get(320, 320), 128);
        assert_eq!(v.get(240, 320), 20);
        assert_eq!(v.get(10, 10), 128);
        assert_eq!(mark.outer_box, Rect::new(220, 220, 200, 200));
        assert_eq!(mark.inner_box, Rect::new(270, 270, 100, 100));
        assert_eq!(mark.overlay, Vector2::zeros());
    }

    #[test]
    fn fractional_shift_mixes_boundary_pixels() {
        let mark = sharp().render(&Scene {
            shift: Vector2::new(0.25, 0.0),
            ..Scene::default()
        });
        let v = mark.image.view();
        // Column 270 is 3/4 inner, column 370 is 1/4 inner.
        assert_eq!(v.get(270, 320), 101);
        assert_eq!(v.get(370, 320), 47);
        assert_eq!(v.get(269, 320), 20);
    }

    #[test]
    fn blur_is_symmetric_for_centered_mark() {
        let mark = MarkRenderer::default().render(&Scene::default());
        let v = mark.image.view();
        for d in 0..6 {
            assert_eq!(v.get(217 + d, 320), v.get(422 - d, 320));
            assert_eq!(v.get(320, 217 + d), v.get(320, 422 - d));
        }
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let scene = Scene {
            noise: 2.0,
            size: 300,
            ..Scene::default()
        };
        let a = MarkRenderer::default().render(&scene).image;
        let b = MarkRenderer::default().render(&scene).image;
        let c = MarkRenderer::new(MarkParams {
            seed: 8,
            ..MarkParams::default()
        })
        .render(&scene)
        .image;
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rotation_turns_overlay_and_grows_boxes() {
        let mark = MarkRenderer::default().render(&Scene {
            shift: Vector2::new(1.0, 0.0),
            angle_deg: 3.0,
            ..Scene::default()
        });
        let a = 3.0f64.to_radians();
        assert_abs_diff_eq!(mark.overlay.x, a.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(mark.overlay.y, a.sin(), epsilon = 1e-12);
        assert!(mark.outer_box.width > 200 && mark.outer_box.width < 215);
        assert_eq!(mark.image.view().get(320, 320), 128);
        assert_eq!(mark.image.view().get(320, 240), 20);
    }

    #[test]
    fn render_mark_matches_default_renderer() {
        let img = render_mark(320, 0.5, -0.5, 0.0, 0.0);
        let mark = MarkRenderer::default().render(&Scene {
            size: 320,
            shift: Vector2::new(0.5, -0.5),
            ..Scene::default()
        });
        assert_eq!(img, mark.image);
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: MarkParams = serde_json::from_str(r#"{"salt_pepper": 0.002}"#).unwrap();
        assert_abs_diff_eq!(p.salt_pepper, 0.002);
        assert_eq!(p.background, 128);
        assert_eq!(p.geometry.outer_size, 200);
    }
}
