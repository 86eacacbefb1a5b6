//! Synthetic box-in-box overlay marks.
//!
//! Marks are rendered by exact area coverage (or supersampling when rotated),
//! blurred by a Gaussian point-spread function, perturbed with Gaussian and
//! salt-and-pepper noise, and quantized to 8 bits. Every render carries its
//! ground truth: the overlay vector and pixel bounding boxes of both boxes,
//! which can stand in for a box detector.

mod noise;
mod render;

pub use render::{render_mark, MarkParams, MarkRenderer, Scene, SyntheticMark};
