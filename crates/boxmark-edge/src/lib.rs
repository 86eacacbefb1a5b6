//! Profile extraction and sub-pixel edge estimation.
//!
//! The fine stage of the overlay measurement works on 1-D profiles: a thin
//! region across an edge is averaged into a [`Profile`], and an [`EdgeModel`]
//! locates the edge inside it.
//!
//! ```
//! use boxmark_edge::{EdgeModel, MomentModel};
//!
//! let profile: Vec<f64> = (0..20).map(|i| if i < 10 { 20.0 } else { 128.0 }).collect();
//! let edge = MomentModel::default().estimate(&profile).unwrap();
//! assert!((edge.position - 9.5).abs() < 1e-9);
//! ```

mod error;
mod model;
mod profile;

pub use error::EdgeError;
pub use model::{
    central_gradient, EdgeModel, EdgeModelKind, MomentModel, MomentParams, SubpixelEdge,
    MIN_PROFILE_LEN,
};
pub use profile::{dynamic_range, extract_profile, extract_window, Profile};
