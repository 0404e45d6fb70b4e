//! Decoration widget carried by a connection.

use super::{ShapeTrait, WidgetId};
use kurbo::Point;

/// A widget drawn at the middle of a connection.
///
/// Decorations belong to the connection they are attached to and are never
/// offered as connection targets.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationShape {
    /// Host widget showing the decoration.
    pub widget: WidgetId,
    /// Where the widget was last placed.
    pub position: Point,
}

impl DecorationShape {
    pub fn new(widget: WidgetId, position: Point) -> Self {
        Self { widget, position }
    }
}

impl ShapeTrait for DecorationShape {
    fn anchor_point(&self, _towards: Point) -> Point {
        self.position
    }

    fn center(&self) -> Point {
        self.position
    }
}
