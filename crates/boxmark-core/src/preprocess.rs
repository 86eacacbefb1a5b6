use serde::{Deserialize, Serialize};

use crate::filter::{equalize_histogram, median_filter};
use crate::{GrayImage, GrayImageView};

/// Opaque image transform applied upstream of gradient-based coarse search.
///
/// Implementations must be idempotent in spirit: running them on an already
/// processed image should not change the edge layout.
pub trait Preprocessor {
    fn preprocess(&self, image: &GrayImageView<'_>) -> GrayImage;
}

/// Median denoising followed by optional histogram equalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterChain {
    /// Median kernel size; `0` or `1` disables the median stage.
    pub median_kernel: usize,
    pub equalize: bool,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self {
            median_kernel: 3,
            equalize: true,
        }
    }
}

impl Preprocessor for FilterChain {
    fn preprocess(&self, image: &GrayImageView<'_>) -> GrayImage {
        let filtered = median_filter(image, self.median_kernel);
        if self.equalize {
            equalize_histogram(&filtered.view())
        } else {
            filtered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_removes_impulse_and_stretches_contrast() {
        let mut img = GrayImage::filled(12, 12, 90);
        for y in 0..12 {
            for x in 6..12 {
                img.set(x, y, 120);
            }
        }
        img.set(2, 2, 255);
        let out = FilterChain::default().preprocess(&img.view());
        assert_eq!(out.data[2 * 12 + 2], 0);
        assert_eq!(out.data[11], 255);
    }

    #[test]
    fn disabled_chain_is_identity() {
        let img = GrayImage::from_raw(3, 1, vec![1, 2, 3]).unwrap();
        let chain = FilterChain {
            median_kernel: 0,
            equalize: false,
        };
        assert_eq!(chain.preprocess(&img.view()), img);
    }
}
