//! Route of a connection as an ordered list of points.

use crate::geometry::{self, Segment};
use crate::shapes::ShapeTrait;
use kurbo::Point;

/// Tolerance used when a waypoint reference is matched by value.
pub const POINT_MATCH_EPSILON: f64 = 1e-6;

/// Ordered route of a connection.
///
/// The first and last points are the anchors of the start and end shapes;
/// everything in between is a user-placed waypoint. A path always holds at
/// least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    /// Create a two-point path between two shapes.
    pub fn straight(start: &impl ShapeTrait, end: &impl ShapeTrait) -> Self {
        let (first, last) = resolve_pair(start, end, end.center());
        Self {
            points: vec![first, last],
        }
    }

    /// Drop every waypoint, leaving `[start anchor, end anchor]`.
    pub fn straighten(&mut self, start: &impl ShapeTrait, end: &impl ShapeTrait) {
        let (first, last) = resolve_pair(start, end, end.center());
        self.points.clear();
        self.points.push(first);
        self.points.push(last);
    }

    /// Recompute the two extreme points from the current shape geometry.
    ///
    /// The number of points never changes.
    pub fn refresh_endpoints(&mut self, start: &impl ShapeTrait, end: &impl ShapeTrait) {
        let n = self.points.len();
        if n == 2 {
            let (first, last) = resolve_pair(start, end, self.points[1]);
            self.points[0] = first;
            self.points[1] = last;
            return;
        }
        self.points[0] = start.anchor_point(self.points[1]);
        self.points[n - 1] = end.anchor_point(self.points[n - 2]);
    }

    /// Insert `point` right before the first point matching `reference`.
    ///
    /// Returns false, leaving the path untouched, when no point matches.
    pub fn insert_waypoint(&mut self, point: Point, reference: Point) -> bool {
        let found = self.points.iter().position(|p| {
            (p.x - reference.x).abs() <= POINT_MATCH_EPSILON
                && (p.y - reference.y).abs() <= POINT_MATCH_EPSILON
        });
        match found {
            // Inserting before the start anchor would displace it.
            Some(0) | None => false,
            Some(index) => {
                self.points.insert(index, point);
                true
            }
        }
    }

    /// Insert `point` at `index`, clamped so both endpoints stay in place.
    ///
    /// Returns the index the waypoint ended up at.
    pub fn insert_waypoint_at(&mut self, index: usize, point: Point) -> usize {
        let index = index.clamp(1, self.points.len() - 1);
        self.points.insert(index, point);
        index
    }

    /// Move an existing point. Out-of-range indices are ignored.
    pub fn set_point(&mut self, index: usize, point: Point) {
        if let Some(p) = self.points.get_mut(index) {
            *p = point;
        }
    }

    /// Waypoints only, without the two anchors.
    pub fn interior_points(&self) -> &[Point] {
        &self.points[1..self.points.len() - 1]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a path built through this type.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn is_straight(&self) -> bool {
        self.points.len() == 2
    }

    /// Consecutive point pairs, from start to end.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Point halfway along the route.
    pub fn midpoint(&self) -> Point {
        geometry::polyline_midpoint(&self.points).unwrap_or_else(|| self.first())
    }
}

/// Upper bound on anchor re-resolution rounds in [`resolve_pair`].
const MAX_ANCHOR_PASSES: usize = 8;

/// Resolve two facing anchors.
///
/// The start anchor is taken towards `hint` and the end anchor towards it.
/// Both are then re-projected against each other until neither moves, so
/// `first == start.anchor_point(last)` and `last == end.anchor_point(first)`.
/// Overlapping shapes may need several rounds.
fn resolve_pair(start: &impl ShapeTrait, end: &impl ShapeTrait, hint: Point) -> (Point, Point) {
    let mut first = start.anchor_point(hint);
    let mut last = end.anchor_point(first);
    for _ in 0..MAX_ANCHOR_PASSES {
        let next_first = start.anchor_point(last);
        let next_last = end.anchor_point(next_first);
        if next_first == first && next_last == last {
            break;
        }
        first = next_first;
        last = next_last;
    }
    (first, last)
}
