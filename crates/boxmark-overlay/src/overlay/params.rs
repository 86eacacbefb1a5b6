use boxmark_coarse::CoarseParams;
use serde::{Deserialize, Serialize};

use crate::{FineParams, PixelScale};

/// Parameters of the full overlay measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    pub coarse: CoarseParams,
    pub fine: FineParams,
    pub scale: PixelScale,
    /// Reject results whose refined edges are not ordered
    /// `outer_start < inner_start < inner_end < outer_end`.
    pub validate_nesting: bool,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            coarse: CoarseParams::default(),
            fine: FineParams::default(),
            scale: PixelScale::default(),
            validate_nesting: true,
        }
    }
}
