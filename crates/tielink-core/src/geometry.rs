//! Geometry primitives used for hit-testing and anchoring.
//!
//! Points, rectangles and vectors come from kurbo. This module adds the
//! proximity tests the controller runs every tick.

use kurbo::{Point, Rect, Vec2};

/// A directed segment between two path points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
}

impl Segment {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Distance from `point` to the nearest point on this segment.
    pub fn distance_to(&self, point: Point) -> f64 {
        distance(point, *self)
    }

    pub fn midpoint(&self) -> Point {
        self.p1.midpoint(self.p2)
    }

    /// Unit vector from `p1` towards `p2` (zero for a degenerate segment).
    pub fn direction(&self) -> Vec2 {
        let v = self.p2 - self.p1;
        let len = v.hypot();
        if len < f64::EPSILON {
            Vec2::ZERO
        } else {
            v / len
        }
    }
}

/// Distance from a point to a segment, clamped to the segment's extent.
pub fn distance(point: Point, segment: Segment) -> f64 {
    let seg = segment.p2 - segment.p1;
    let pv = point - segment.p1;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = segment.p1 + seg * t;
    (point - proj).hypot()
}

/// Axis-aligned containment, inclusive of all four edges.
///
/// `kurbo::Rect::contains` excludes the right and bottom edges, so it is not
/// used for hit-testing widgets.
pub fn contains(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Point on the boundary of `rect` nearest to `towards`.
pub fn anchor_point(rect: Rect, towards: Point) -> Point {
    let rect = rect.abs();
    if !contains(rect, towards) {
        return Point::new(
            towards.x.clamp(rect.x0, rect.x1),
            towards.y.clamp(rect.y0, rect.y1),
        );
    }

    // Inside: project onto the closest edge.
    let to_left = towards.x - rect.x0;
    let to_right = rect.x1 - towards.x;
    let to_top = towards.y - rect.y0;
    let to_bottom = rect.y1 - towards.y;
    let nearest = to_left.min(to_right).min(to_top).min(to_bottom);

    if nearest == to_left {
        Point::new(rect.x0, towards.y)
    } else if nearest == to_right {
        Point::new(rect.x1, towards.y)
    } else if nearest == to_top {
        Point::new(towards.x, rect.y0)
    } else {
        Point::new(towards.x, rect.y1)
    }
}

/// True if `point` lies within `margin` of the boundary of `rect`.
pub fn near_boundary(rect: Rect, point: Point, margin: f64) -> bool {
    let rect = rect.abs();
    let outer = rect.inflate(margin, margin);
    if !contains(outer, point) {
        return false;
    }
    let inner = rect.inflate(-margin, -margin);
    // A rectangle thinner than twice the margin has no interior left.
    if inner.width() <= 0.0 || inner.height() <= 0.0 {
        return true;
    }
    !(point.x > inner.x0 && point.x < inner.x1 && point.y > inner.y0 && point.y < inner.y1)
}

/// Point halfway along a polyline, measured by arc length.
pub fn polyline_midpoint(points: &[Point]) -> Option<Point> {
    let first = *points.first()?;
    let total: f64 = points.windows(2).map(|w| (w[1] - w[0]).hypot()).sum();
    if total < f64::EPSILON {
        return Some(first);
    }

    let mut remaining = total / 2.0;
    for w in points.windows(2) {
        let len = (w[1] - w[0]).hypot();
        if remaining <= len && len > 0.0 {
            return Some(w[0].lerp(w[1], remaining / len));
        }
        remaining -= len;
    }
    points.last().copied()
}
