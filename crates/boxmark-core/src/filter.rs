//! Small image filters used by the locators and the preprocessing chain.
//!
//! All filters replicate border pixels.

use crate::{Axis, GrayImage, GrayImageView};

/// Median filter with a square `kernel x kernel` window.
///
/// Even kernel sizes are rounded up to the next odd size; `kernel <= 1`
/// returns a copy.
pub fn median_filter(src: &GrayImageView<'_>, kernel: usize) -> GrayImage {
    if kernel <= 1 || src.width == 0 || src.height == 0 {
        return src.to_owned_image();
    }
    let k = kernel | 1;
    let r = (k / 2) as isize;
    let mid = k * k / 2;
    let mut window = Vec::with_capacity(k * k);
    let mut out = Vec::with_capacity(src.width * src.height);

    for y in 0..src.height as isize {
        for x in 0..src.width as isize {
            window.clear();
            for dy in -r..=r {
                for dx in -r..=r {
                    window.push(src.get_clamped(x + dx, y + dy));
                }
            }
            let (_, median, _) = window.select_nth_unstable(mid);
            out.push(*median);
        }
    }

    GrayImage {
        width: src.width,
        height: src.height,
        data: out,
    }
}

/// Global histogram equalization (cumulative-histogram remapping).
///
/// Constant images are returned unchanged.
pub fn equalize_histogram(src: &GrayImageView<'_>) -> GrayImage {
    let mut hist = [0u64; 256];
    for &v in src.data {
        hist[v as usize] += 1;
    }
    let total = src.data.len() as u64;
    let cdf_min = hist.iter().copied().find(|&h| h > 0).unwrap_or(0);
    if total == 0 || cdf_min == total {
        return src.to_owned_image();
    }

    let mut lut = [0u8; 256];
    let mut acc = 0u64;
    let denom = (total - cdf_min) as f64;
    for (v, &h) in hist.iter().enumerate() {
        acc += h;
        let mapped = (acc.saturating_sub(cdf_min)) as f64 * 255.0 / denom;
        lut[v] = mapped.round().clamp(0.0, 255.0) as u8;
    }

    GrayImage {
        width: src.width,
        height: src.height,
        data: src.data.iter().map(|&v| lut[v as usize]).collect(),
    }
}

/// 3x3 Sobel derivative along `axis`, returned row-major as `f32`.
pub fn sobel(src: &GrayImageView<'_>, axis: Axis) -> Vec<f32> {
    let mut out = Vec::with_capacity(src.width * src.height);
    let px = |x: isize, y: isize| src.get_clamped(x, y) as f32;
    for y in 0..src.height as isize {
        for x in 0..src.width as isize {
            let g = match axis {
                Axis::X => {
                    (px(x + 1, y - 1) - px(x - 1, y - 1))
                        + 2.0 * (px(x + 1, y) - px(x - 1, y))
                        + (px(x + 1, y + 1) - px(x - 1, y + 1))
                }
                Axis::Y => {
                    (px(x - 1, y + 1) - px(x - 1, y - 1))
                        + 2.0 * (px(x, y + 1) - px(x, y - 1))
                        + (px(x + 1, y + 1) - px(x + 1, y - 1))
                }
            };
            out.push(g);
        }
    }
    out
}

/// Normalized 1-D Gaussian kernel with radius `ceil(3 * sigma)`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if sigma.is_nan() || sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i32;
    let mut k: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = k.iter().sum();
    for v in &mut k {
        *v /= sum;
    }
    k
}

/// In-place separable convolution of a row-major `f64` buffer.
pub fn convolve_separable(data: &mut [f64], width: usize, height: usize, kernel: &[f64]) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let r = (kernel.len() / 2) as isize;
    let mut line = Vec::with_capacity(width.max(height));

    for y in 0..height {
        let row = &mut data[y * width..(y + 1) * width];
        line.clear();
        line.extend_from_slice(row);
        for (x, dst) in row.iter_mut().enumerate() {
            *dst = convolve_at(&line, x as isize, r, kernel);
        }
    }

    for x in 0..width {
        line.clear();
        line.extend((0..height).map(|y| data[y * width + x]));
        for y in 0..height {
            data[y * width + x] = convolve_at(&line, y as isize, r, kernel);
        }
    }
}

#[inline]
fn convolve_at(line: &[f64], i: isize, r: isize, kernel: &[f64]) -> f64 {
    let last = line.len() as isize - 1;
    kernel
        .iter()
        .enumerate()
        .map(|(k, &w)| w * line[(i + k as isize - r).clamp(0, last) as usize])
        .sum()
}

/// Halve both dimensions by averaging 2x2 blocks (rounded).
pub fn downsample_2x(src: &GrayImageView<'_>) -> GrayImage {
    let w = src.width / 2;
    let h = src.height / 2;
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        let r0 = src.row(2 * y);
        let r1 = src.row(2 * y + 1);
        for x in 0..w {
            let s = r0[2 * x] as u32 + r0[2 * x + 1] as u32 + r1[2 * x] as u32 + r1[2 * x + 1] as u32;
            data.push(((s + 2) / 4) as u8);
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}
