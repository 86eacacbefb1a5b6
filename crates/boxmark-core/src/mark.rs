//! Box-in-box mark geometry and the eight-edge sets produced by the locators.
//!
//! Edge positions are expressed in pixel-index coordinates: pixel `i` has its
//! center at `i`. Along each axis the four edges are ordered
//! `outer_start < inner_start < inner_end < outer_end` (left to right for X,
//! top to bottom for Y).

use std::fmt;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{Axis, Rect};

/// Nominal side lengths of the nested boxes, in pixels.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxGeometry {
    pub outer_size: i32,
    pub inner_size: i32,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self {
            outer_size: 200,
            inner_size: 100,
        }
    }
}

impl BoxGeometry {
    /// Distance between an outer edge and the neighbouring inner edge.
    #[inline]
    pub fn edge_gap(&self) -> i32 {
        (self.outer_size - self.inner_size) / 2
    }

    /// Nominal edge positions of a mark centered at `center`.
    pub fn edges_around(&self, center: Point2<i32>) -> CoarseEdges {
        let quad = |c: i32| AxisEdges {
            outer_start: c - self.outer_size / 2,
            inner_start: c - self.inner_size / 2,
            inner_end: c + self.inner_size / 2,
            outer_end: c + self.outer_size / 2,
        };
        EdgeSet {
            x: quad(center.x),
            y: quad(center.y),
        }
    }
}

/// Position of an edge within the four edges of one axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRole {
    OuterStart,
    InnerStart,
    InnerEnd,
    OuterEnd,
}

impl EdgeRole {
    pub const ALL: [EdgeRole; 4] = [
        EdgeRole::OuterStart,
        EdgeRole::InnerStart,
        EdgeRole::InnerEnd,
        EdgeRole::OuterEnd,
    ];
}

/// One of the eight edges of a box-in-box mark.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    pub axis: Axis,
    pub role: EdgeRole,
}

impl EdgeId {
    /// All eight edges, X axis first.
    pub fn all() -> impl Iterator<Item = EdgeId> {
        Axis::BOTH
            .into_iter()
            .flat_map(|axis| EdgeRole::ALL.into_iter().map(move |role| EdgeId { axis, role }))
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (box_name, side) = match (self.axis, self.role) {
            (Axis::X, EdgeRole::OuterStart) => ("outer", "left"),
            (Axis::X, EdgeRole::InnerStart) => ("inner", "left"),
            (Axis::X, EdgeRole::InnerEnd) => ("inner", "right"),
            (Axis::X, EdgeRole::OuterEnd) => ("outer", "right"),
            (Axis::Y, EdgeRole::OuterStart) => ("outer", "top"),
            (Axis::Y, EdgeRole::InnerStart) => ("inner", "top"),
            (Axis::Y, EdgeRole::InnerEnd) => ("inner", "bottom"),
            (Axis::Y, EdgeRole::OuterEnd) => ("outer", "bottom"),
        };
        write!(f, "{box_name}-{side}")
    }
}

/// The four edge positions along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEdges<T> {
    pub outer_start: T,
    pub inner_start: T,
    pub inner_end: T,
    pub outer_end: T,
}

impl<T: Copy> AxisEdges<T> {
    #[inline]
    pub fn get(&self, role: EdgeRole) -> T {
        match role {
            EdgeRole::OuterStart => self.outer_start,
            EdgeRole::InnerStart => self.inner_start,
            EdgeRole::InnerEnd => self.inner_end,
            EdgeRole::OuterEnd => self.outer_end,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, role: EdgeRole) -> &mut T {
        match role {
            EdgeRole::OuterStart => &mut self.outer_start,
            EdgeRole::InnerStart => &mut self.inner_start,
            EdgeRole::InnerEnd => &mut self.inner_end,
            EdgeRole::OuterEnd => &mut self.outer_end,
        }
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> AxisEdges<U> {
        AxisEdges {
            outer_start: f(self.outer_start),
            inner_start: f(self.inner_start),
            inner_end: f(self.inner_end),
            outer_end: f(self.outer_end),
        }
    }
}

impl<T: Copy + PartialOrd> AxisEdges<T> {
    /// `outer_start < inner_start < inner_end < outer_end`.
    pub fn is_nested(&self) -> bool {
        self.outer_start < self.inner_start
            && self.inner_start < self.inner_end
            && self.inner_end < self.outer_end
    }
}

impl<T: Copy + Into<f64>> AxisEdges<T> {
    pub fn outer_center(&self) -> f64 {
        0.5 * (self.outer_start.into() + self.outer_end.into())
    }

    pub fn inner_center(&self) -> f64 {
        0.5 * (self.inner_start.into() + self.inner_end.into())
    }

    /// Inner center minus outer center.
    pub fn overlay(&self) -> f64 {
        self.inner_center() - self.outer_center()
    }
}

/// Edge positions for both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSet<T> {
    pub x: AxisEdges<T>,
    pub y: AxisEdges<T>,
}

/// Pixel-level edge positions from the coarse stage.
pub type CoarseEdges = EdgeSet<i32>;

/// Sub-pixel edge positions from the fine stage.
pub type FineEdges = EdgeSet<f64>;

impl<T: Copy> EdgeSet<T> {
    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisEdges<T> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    #[inline]
    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisEdges<T> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    #[inline]
    pub fn get(&self, id: EdgeId) -> T {
        self.axis(id.axis).get(id.role)
    }

    #[inline]
    pub fn get_mut(&mut self, id: EdgeId) -> &mut T {
        self.axis_mut(id.axis).get_mut(id.role)
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> EdgeSet<U> {
        EdgeSet {
            x: self.x.map(&f),
            y: self.y.map(&f),
        }
    }

    /// `(edge, position)` pairs in [`EdgeId::all`] order.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, T)> + '_ {
        EdgeId::all().map(move |id| (id, self.get(id)))
    }
}

impl<T: Copy + Into<f64>> EdgeSet<T> {
    pub fn outer_center(&self) -> Point2<f64> {
        Point2::new(self.x.outer_center(), self.y.outer_center())
    }

    pub fn inner_center(&self) -> Point2<f64> {
        Point2::new(self.x.inner_center(), self.y.inner_center())
    }

    /// Overlay error: inner center minus outer center.
    pub fn overlay(&self) -> Vector2<f64> {
        self.inner_center() - self.outer_center()
    }
}

impl CoarseEdges {
    /// Edges taken literally from an outer and an inner bounding box.
    pub fn from_boxes(outer: Rect, inner: Rect) -> Self {
        EdgeSet {
            x: AxisEdges {
                outer_start: outer.x,
                inner_start: inner.x,
                inner_end: inner.right(),
                outer_end: outer.right(),
            },
            y: AxisEdges {
                outer_start: outer.y,
                inner_start: inner.y,
                inner_end: inner.bottom(),
                outer_end: outer.bottom(),
            },
        }
    }

    /// Bounding rectangle of the outer box.
    pub fn outer_rect(&self) -> Rect {
        Rect::new(
            self.x.outer_start,
            self.y.outer_start,
            self.x.outer_end - self.x.outer_start,
            self.y.outer_end - self.y.outer_start,
        )
    }

    /// Integer center of the outer box, used to place the cross-axis ROIs.
    pub fn outer_midpoint(&self) -> Point2<i32> {
        Point2::new(
            (self.x.outer_start + self.x.outer_end).div_euclid(2),
            (self.y.outer_start + self.y.outer_end).div_euclid(2),
        )
    }
}
