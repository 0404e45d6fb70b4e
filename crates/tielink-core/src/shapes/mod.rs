//! Shapes that can anchor one end of a connection.

mod anchored;
mod decoration;
mod mouse;
mod registry;

pub use anchored::AnchoredShape;
pub use decoration::DecorationShape;
pub use mouse::MouseShape;
pub use registry::ShapeRegistry;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for tracked shapes.
pub type ShapeId = Uuid;

/// Opaque handle of a widget owned by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Common capability of every shape.
pub trait ShapeTrait {
    /// Point where a connection coming from `towards` terminates.
    fn anchor_point(&self, towards: Point) -> Point;

    /// Reference point used before any opposite anchor is known.
    fn center(&self) -> Point;

    /// Selectable region, if the shape has one.
    fn bounding_rect(&self) -> Option<Rect> {
        None
    }
}

/// Tagged union over the shape variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Anchored(AnchoredShape),
    Mouse(MouseShape),
    Decoration(DecorationShape),
}

impl Shape {
    pub fn anchor_point(&self, towards: Point) -> Point {
        match self {
            Shape::Anchored(s) => s.anchor_point(towards),
            Shape::Mouse(s) => s.anchor_point(towards),
            Shape::Decoration(s) => s.anchor_point(towards),
        }
    }

    pub fn center(&self) -> Point {
        match self {
            Shape::Anchored(s) => s.center(),
            Shape::Mouse(s) => s.center(),
            Shape::Decoration(s) => s.center(),
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Shape::Anchored(s) => s.bounding_rect(),
            Shape::Mouse(s) => s.bounding_rect(),
            Shape::Decoration(s) => s.bounding_rect(),
        }
    }
}

impl ShapeTrait for Shape {
    fn anchor_point(&self, towards: Point) -> Point {
        Shape::anchor_point(self, towards)
    }

    fn center(&self) -> Point {
        Shape::center(self)
    }

    fn bounding_rect(&self) -> Option<Rect> {
        Shape::bounding_rect(self)
    }
}

/// Reference from a connection to one of its endpoint shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    /// A shape tracked in the registry.
    Tracked(ShapeId),
    /// The live pointer, used by a connection that is still being built.
    Pointer,
}

impl ShapeRef {
    pub fn tracked(self) -> Option<ShapeId> {
        match self {
            ShapeRef::Tracked(id) => Some(id),
            ShapeRef::Pointer => None,
        }
    }
}
