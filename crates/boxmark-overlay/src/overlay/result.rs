use boxmark_core::{CoarseEdges, FineEdges};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Conversion between pixels and a physical length unit.
///
/// Both directions are fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelScale {
    pub px_per_unit: f64,
    pub unit_per_px: f64,
}

impl PixelScale {
    /// Scale of a sensor imaging `extent` physical units onto `pixels` pixels.
    pub fn from_field_of_view(pixels: f64, extent: f64) -> Self {
        Self {
            px_per_unit: pixels / extent,
            unit_per_px: extent / pixels,
        }
    }

    #[inline]
    pub fn to_physical(&self, px: Vector2<f64>) -> Vector2<f64> {
        px * self.unit_per_px
    }

    #[inline]
    pub fn to_pixels(&self, physical: Vector2<f64>) -> Vector2<f64> {
        physical * self.px_per_unit
    }
}

impl Default for PixelScale {
    /// 766 pixels across a 50 µm field of view.
    fn default() -> Self {
        Self::from_field_of_view(766.0, 50.0)
    }
}

/// Outcome of one successful overlay measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayResult {
    /// Inner center minus outer center, in pixels.
    pub error_px: Vector2<f64>,
    /// `error_px` in physical units.
    pub error_physical: Vector2<f64>,
    pub outer_center: Point2<f64>,
    pub inner_center: Point2<f64>,
    /// Sub-pixel edge positions.
    pub fine: FineEdges,
    /// Pixel-level edge positions the fine stage started from.
    pub coarse: CoarseEdges,
}
