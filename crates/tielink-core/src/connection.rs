//! Connections between shapes.

use crate::geometry::Segment;
use crate::host::{SegmentStyle, Surface};
use crate::path::Path;
use crate::shapes::{DecorationShape, ShapeRef, ShapeTrait};
use kurbo::{BezPath, PathEl, Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// How a connection is routed through its points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStyle {
    /// Single segment between the two anchors.
    #[default]
    Straight,
    /// Smooth curve through the waypoints.
    Curved,
}

/// Where a new waypoint would go if the user grabbed the path here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointCandidate {
    /// Midpoint of the nearest segment.
    pub position: Point,
    /// Index of the nearest segment (between points `segment` and `segment + 1`).
    pub segment: usize,
    /// Far endpoint of the nearest segment; the waypoint goes right before it.
    pub reference: Point,
    /// Distance from the query point to the segment.
    pub distance: f64,
}

impl WaypointCandidate {
    /// Path index the waypoint takes once inserted.
    pub fn insert_index(&self) -> usize {
        self.segment + 1
    }
}

/// Handle on a waypoint being dragged.
///
/// While tracking, the point mirrors the pointer on every tick. Once fixed it
/// keeps its last value and stays in the path as an ordinary waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovablePoint {
    connection: ConnectionId,
    index: usize,
    position: Point,
    fixed: bool,
}

impl MovablePoint {
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Index of the waypoint in its connection's path.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Follow the pointer. Fixed points ignore this.
    pub fn track(&mut self, pointer: Point) -> Point {
        if !self.fixed {
            self.position = pointer;
        }
        self.position
    }

    /// Freeze the point at `at`.
    pub fn fix(&mut self, at: Point) {
        self.track(at);
        self.fixed = true;
    }
}

/// A routed line between two shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    start: ShapeRef,
    end: ShapeRef,
    path: Path,
    style: ConnectionStyle,
    arrow: bool,
    decoration: Option<DecorationShape>,
}

impl Connection {
    /// Create a straight connection between two resolved shapes.
    pub fn new(
        start_ref: ShapeRef,
        start: &impl ShapeTrait,
        end_ref: ShapeRef,
        end: &impl ShapeTrait,
        arrow: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            start: start_ref,
            end: end_ref,
            path: Path::straight(start, end),
            style: ConnectionStyle::Straight,
            arrow,
            decoration: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn start(&self) -> ShapeRef {
        self.start
    }

    pub fn end(&self) -> ShapeRef {
        self.end
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn style(&self) -> ConnectionStyle {
        self.style
    }

    pub fn has_arrow(&self) -> bool {
        self.arrow
    }

    /// True if either end is the given shape reference.
    pub fn touches(&self, shape: ShapeRef) -> bool {
        self.start == shape || self.end == shape
    }

    /// Re-anchor both extremes on the current shape geometry.
    pub fn refresh(&mut self, start: &impl ShapeTrait, end: &impl ShapeTrait) {
        self.path.refresh_endpoints(start, end);
    }

    /// Smallest distance from `point` to any segment of the path.
    pub fn distance_to(&self, point: Point) -> f64 {
        self.path
            .segments()
            .map(|s| s.distance_to(point))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn is_near_pointer(&self, point: Point, threshold: f64) -> bool {
        self.distance_to(point) <= threshold
    }

    /// Midpoint of the segment nearest to `point`.
    pub fn nearest_segment_midpoint_for(&self, point: Point) -> WaypointCandidate {
        let mut best: Option<(usize, Segment, f64)> = None;
        for (i, segment) in self.path.segments().enumerate() {
            let d = segment.distance_to(point);
            if best.is_none_or(|(_, _, bd)| d < bd) {
                best = Some((i, segment, d));
            }
        }
        // A path always has at least one segment.
        let (segment, seg, distance) =
            best.unwrap_or((0, Segment::new(self.path.first(), self.path.last()), f64::INFINITY));
        WaypointCandidate {
            position: seg.midpoint(),
            segment,
            reference: seg.p2,
            distance,
        }
    }

    /// Insert a waypoint at `candidate` and hand back a tracking handle.
    ///
    /// The connection switches to curved routing.
    pub fn add_movable_point(&mut self, candidate: WaypointCandidate) -> MovablePoint {
        let index = self
            .path
            .insert_waypoint_at(candidate.insert_index(), candidate.position);
        self.style = ConnectionStyle::Curved;
        MovablePoint {
            connection: self.id,
            index,
            position: candidate.position,
            fixed: false,
        }
    }

    /// Write a movable point's current value into the path.
    pub fn apply_movable_point(&mut self, point: &MovablePoint) {
        if point.connection == self.id {
            self.path.set_point(point.index, point.position);
        }
    }

    /// Switch to straight routing, dropping every waypoint.
    pub fn toggle_straight(&mut self, start: &impl ShapeTrait, end: &impl ShapeTrait) {
        self.style = ConnectionStyle::Straight;
        self.path.straighten(start, end);
    }

    pub fn decoration(&self) -> Option<&DecorationShape> {
        self.decoration.as_ref()
    }

    /// Attach a decoration, returning the one it replaces.
    pub fn attach_decoration(&mut self, decoration: DecorationShape) -> Option<DecorationShape> {
        self.decoration.replace(decoration)
    }

    /// Give the decoration back to the caller, who disposes its widget.
    pub fn detach_decoration(&mut self) -> Option<DecorationShape> {
        self.decoration.take()
    }

    /// Move the decoration to the middle of the route and return where it went.
    pub fn layout_decoration(&mut self) -> Option<&DecorationShape> {
        let mid = self.path.midpoint();
        let deco = self.decoration.as_mut()?;
        deco.position = mid;
        Some(deco)
    }

    /// Smooth route through all points (Catmull-Rom converted to cubics).
    pub fn curve(&self) -> BezPath {
        let points = self.path.points();
        let mut path = BezPath::new();
        path.move_to(points[0]);
        let tension = 0.5;
        for i in 0..points.len() - 1 {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(points.len() - 1)];

            let t1 = (p2 - p0) * tension;
            let t2 = (p3 - p1) * tension;
            path.curve_to(p1 + t1 / 3.0, p2 - t2 / 3.0, p2);
        }
        path
    }

    /// Points actually drawn: the path itself, or the flattened curve.
    pub fn rendered_points(&self, tolerance: f64) -> Vec<Point> {
        if self.style == ConnectionStyle::Straight || self.path.is_straight() {
            return self.path.points().to_vec();
        }
        let mut out = Vec::new();
        kurbo::flatten(&self.curve(), tolerance, |el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => out.push(p),
            _ => {}
        });
        out
    }

    /// Paint the connection onto a surface.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        style: &SegmentStyle,
        arrow_size: f64,
        tolerance: f64,
    ) {
        let points = self.rendered_points(tolerance);
        for w in points.windows(2) {
            surface.draw_segment(w[0], w[1], style);
        }
        if self.arrow {
            if let Some(direction) = final_direction(&points) {
                surface.draw_arrowhead(self.path.last(), direction, arrow_size, style);
            }
        }
    }
}

/// Direction of the last non-degenerate segment.
fn final_direction(points: &[Point]) -> Option<Vec2> {
    points
        .windows(2)
        .rev()
        .map(|w| Segment::new(w[0], w[1]).direction())
        .find(|d| *d != Vec2::ZERO)
}
