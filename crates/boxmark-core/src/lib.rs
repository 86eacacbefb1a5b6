//! Core types and utilities for box-in-box overlay metrology.
//!
//! This crate holds the pieces shared by the coarse and fine locators:
//! borrowed/owned grayscale images, integer rectangles, the nested-box
//! geometry with its eight-edge sets, and a handful of small filters.
//! It performs no file I/O.

mod filter;
mod image;
mod logger;
mod mark;
mod preprocess;
mod rect;

pub use filter::{
    convolve_separable, downsample_2x, equalize_histogram, gaussian_kernel, median_filter, sobel,
};
pub use image::{GrayImage, GrayImageView, ImageError};
pub use mark::{AxisEdges, BoxGeometry, CoarseEdges, EdgeId, EdgeRole, EdgeSet, FineEdges};
pub use preprocess::{FilterChain, Preprocessor};
pub use rect::{Axis, Rect};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
