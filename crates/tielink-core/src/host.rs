//! Contracts of the collaborators the controller drives.
//!
//! The controller owns one [`Surface`] (where connections are painted) and
//! one [`WidgetHost`] (the UI toolkit that places the widgets). Neither ever
//! sees the controller's shape map or connection set.

use crate::connection::ConnectionId;
use crate::shapes::WidgetId;
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Stroke parameters for one drawn segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentStyle {
    pub color: Color,
    pub width: f64,
    /// Connection still being dragged out by the user.
    pub provisional: bool,
}

impl SegmentStyle {
    pub fn committed() -> Self {
        Self {
            color: Color::from_rgba8(60, 60, 60, 255),
            width: 2.0,
            provisional: false,
        }
    }

    pub fn provisional() -> Self {
        Self {
            color: Color::from_rgba8(59, 130, 246, 255),
            width: 2.0,
            provisional: true,
        }
    }
}

impl Default for SegmentStyle {
    fn default() -> Self {
        Self::committed()
    }
}

/// Rendering collaborator.
pub trait Surface {
    /// Erase everything drawn during the previous tick.
    fn clear_surface(&mut self);

    fn draw_segment(&mut self, p1: Point, p2: Point, style: &SegmentStyle);

    /// Arrowhead with its tip at `at`, pointing along `direction` (unit).
    fn draw_arrowhead(&mut self, at: Point, direction: Vec2, size: f64, style: &SegmentStyle);

    /// Background grid.
    fn draw_grid(&mut self, _spacing: f64) {}

    /// Marker where a waypoint would be inserted.
    fn draw_point_marker(&mut self, _at: Point) {}

    /// Border zone of a shape a connection can be started from.
    fn draw_selectable_area(&mut self, _rect: Rect) {}
}

/// Pointer cursor requested from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Actions offered by the contextual menu of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextAction {
    Delete,
    SetStraight,
}

/// Request to show the contextual menu of a connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenuRequest {
    pub connection: ConnectionId,
    /// Pointer position when the menu was requested.
    pub position: Point,
}

/// Widget placement collaborator.
pub trait WidgetHost {
    /// Move a widget so its top-left corner sits at (x, y).
    fn place(&mut self, widget: WidgetId, x: f64, y: f64);

    /// Take a widget off the surface.
    fn remove(&mut self, widget: WidgetId);

    /// Current bounding rectangle, or `None` if the host does not know it.
    fn bounding_rectangle_of(&self, widget: WidgetId) -> Option<Rect>;

    fn set_highlighted(&mut self, _widget: WidgetId, _highlighted: bool) {}

    fn set_cursor(&mut self, _cursor: CursorStyle) {}

    /// Show the delete / set-straight menu; the host answers through
    /// `DiagramController::apply_context_action`.
    fn open_context_menu(&mut self, _request: ContextMenuRequest) {}
}
