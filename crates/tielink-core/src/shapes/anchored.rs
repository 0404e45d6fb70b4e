//! Shape backed by a host widget.

use super::{ShapeId, ShapeTrait, WidgetId};
use crate::geometry;
use kurbo::{Point, Rect};
use uuid::Uuid;

/// A connectable shape whose geometry mirrors a host widget.
///
/// The bounding rectangle is a snapshot of the widget's placement and is
/// refreshed from the host at the start of every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredShape {
    pub(crate) id: ShapeId,
    /// Host widget this shape tracks.
    pub widget: WidgetId,
    /// Last known bounding rectangle of the widget.
    pub rect: Rect,
}

impl AnchoredShape {
    pub fn new(widget: WidgetId, rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            widget,
            rect: rect.abs(),
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Replace the cached rectangle with the widget's current placement.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect.abs();
    }

    /// True if `point` is on or inside the widget's rectangle.
    pub fn contains(&self, point: Point) -> bool {
        geometry::contains(self.rect, point)
    }

    /// True if `point` is within `margin` of the widget's border.
    pub fn is_near_selectable_area(&self, point: Point, margin: f64) -> bool {
        geometry::near_boundary(self.rect, point, margin)
    }
}

impl ShapeTrait for AnchoredShape {
    fn anchor_point(&self, towards: Point) -> Point {
        geometry::anchor_point(self.rect, towards)
    }

    fn center(&self) -> Point {
        self.rect.center()
    }

    fn bounding_rect(&self) -> Option<Rect> {
        Some(self.rect)
    }
}
