//! Projection profiles across edges.

use boxmark_core::{Axis, GrayImageView, Rect};

/// Averaged projection of a measurement region.
pub type Profile = Vec<f64>;

/// Project `roi` onto `axis` by averaging across the orthogonal direction.
///
/// The ROI is clipped to the image first; the profile starts at the clipped
/// origin and has the clipped extent along `axis`. Returns `None` when the
/// clipped region is empty.
pub fn extract_profile(image: &GrayImageView<'_>, roi: Rect, axis: Axis) -> Option<Profile> {
    let clipped = roi.clip_to(image.bounds());
    if clipped.is_empty() {
        return None;
    }
    let (x0, y0) = (clipped.x as usize, clipped.y as usize);
    let (w, h) = (clipped.width as usize, clipped.height as usize);

    let profile = match axis {
        Axis::X => {
            let mut sums = vec![0.0f64; w];
            for y in y0..y0 + h {
                let row = &image.row(y)[x0..x0 + w];
                for (s, &v) in sums.iter_mut().zip(row) {
                    *s += v as f64;
                }
            }
            let n = h as f64;
            sums.into_iter().map(|s| s / n).collect()
        }
        Axis::Y => (y0..y0 + h)
            .map(|y| {
                let row = &image.row(y)[x0..x0 + w];
                row.iter().map(|&v| v as f64).sum::<f64>() / w as f64
            })
            .collect(),
    };
    Some(profile)
}

/// Gather `2 * radius + 1` samples of `sequence` centered at `center`.
///
/// Indices outside the sequence are clamped to its ends, so the window has a
/// fixed length even at the boundaries. An empty sequence yields an empty
/// window.
pub fn extract_window(sequence: &[f64], center: isize, radius: usize) -> Profile {
    if sequence.is_empty() {
        return Vec::new();
    }
    let last = sequence.len() as isize - 1;
    let r = radius as isize;
    (center - r..=center + r)
        .map(|i| sequence[i.clamp(0, last) as usize])
        .collect()
}

/// `max - min` of a profile; zero for empty input.
pub fn dynamic_range(profile: &[f64]) -> f64 {
    if profile.is_empty() {
        return 0.0;
    }
    let (lo, hi) = profile
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use boxmark_core::GrayImage;

    fn gradient_image() -> GrayImage {
        // value = 10 * x + y
        let (w, h) = (8usize, 5usize);
        let data = (0..h)
            .flat_map(|y| (0..w).map(move |x| (10 * x + y) as u8))
            .collect();
        GrayImage::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn x_profile_averages_rows() {
        let img = gradient_image();
        let p = extract_profile(&img.view(), Rect::new(2, 1, 3, 3), Axis::X).unwrap();
        assert_eq!(p.len(), 3);
        assert_abs_diff_eq!(p[0], 22.0);
        assert_abs_diff_eq!(p[2], 42.0);
    }

    #[test]
    fn y_profile_averages_columns() {
        let img = gradient_image();
        let p = extract_profile(&img.view(), Rect::new(0, 0, 2, 5), Axis::Y).unwrap();
        assert_eq!(p.len(), 5);
        assert_abs_diff_eq!(p[0], 5.0);
        assert_abs_diff_eq!(p[4], 9.0);
    }

    #[test]
    fn clipped_roi_shortens_profile() {
        let img = gradient_image();
        let p = extract_profile(&img.view(), Rect::new(6, 0, 10, 5), Axis::X).unwrap();
        assert_eq!(p.len(), 2);
        assert!(extract_profile(&img.view(), Rect::new(8, 0, 4, 4), Axis::X).is_none());
    }

    #[test]
    fn window_replicates_boundary_values() {
        let seq: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let w = extract_window(&seq, 0, 5);
        assert_eq!(w.len(), 11);
        assert_eq!(&w[..6], &[0.0; 6]);
        assert_eq!(w[10], 5.0);

        let w = extract_window(&seq, 9, 3);
        assert_eq!(w, vec![6.0, 7.0, 8.0, 9.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn window_far_outside_is_constant() {
        let seq = [1.0, 2.0, 3.0];
        assert_eq!(extract_window(&seq, -20, 2), vec![1.0; 5]);
        assert!(extract_window(&[], 0, 2).is_empty());
    }

    #[test]
    fn dynamic_range_of_ramp() {
        assert_abs_diff_eq!(dynamic_range(&[3.0, -1.0, 7.5]), 8.5);
        assert_eq!(dynamic_range(&[]), 0.0);
    }
}
