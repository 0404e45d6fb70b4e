//! Transient shape that follows the pointer.

use super::ShapeTrait;
use kurbo::Point;

/// End of a connection that is still being dragged out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseShape {
    pub position: Point,
}

impl MouseShape {
    pub fn new(position: Point) -> Self {
        Self { position }
    }
}

impl ShapeTrait for MouseShape {
    fn anchor_point(&self, _towards: Point) -> Point {
        self.position
    }

    fn center(&self) -> Point {
        self.position
    }
}
