use serde::{Deserialize, Serialize};

/// Measurement axis of a profile or an edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Horizontal: profiles run along columns, vertical edges are located.
    X,
    /// Vertical: profiles run along rows, horizontal edges are located.
    Y,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    #[inline]
    pub fn cross(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Integer axis-aligned pixel rectangle.
///
/// `width` and `height` are never negative; constructors clamp them to zero.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Rectangle of the given extent whose center pixel is `(cx, cy)`.
    pub fn centered(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self::new(cx - width / 2, cy - height / 2, width, height)
    }

    /// Thin rectangle spanning `length` along `axis` and `width` across it.
    pub fn oriented(axis: Axis, along: i32, across: i32, length: i32, width: i32) -> Self {
        match axis {
            Axis::X => Self::centered(along, across, length, width),
            Axis::Y => Self::centered(across, along, width, length),
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Offset of the rectangle along `axis`.
    #[inline]
    pub fn origin(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Extent of the rectangle along `axis`.
    #[inline]
    pub fn extent(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Intersection; empty rectangles keep the clamped origin.
    pub fn intersect(&self, other: Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Same as [`Rect::intersect`], named for the image-bounds use case.
    #[inline]
    pub fn clip_to(&self, bounds: Rect) -> Rect {
        self.intersect(bounds)
    }

    /// Scale origin and extent by `1 / 2^levels` (floor).
    pub fn downscale(&self, levels: u32) -> Rect {
        let s = 1i32 << levels;
        Rect::new(
            self.x.div_euclid(s),
            self.y.div_euclid(s),
            self.width / s,
            self.height / s,
        )
    }
}
