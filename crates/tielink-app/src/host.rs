//! Headless widget host used when replaying scripts.

use kurbo::{Rect, Size};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tielink_core::{ContextMenuRequest, CursorStyle, WidgetHost, WidgetId};

/// Keeps widget rectangles in memory and logs UI feedback.
#[derive(Debug, Default)]
pub struct ScriptHost {
    rects: BTreeMap<WidgetId, Rect>,
    /// Sizes for widgets not placed yet.
    sizes: HashMap<WidgetId, Size>,
    highlighted: BTreeSet<WidgetId>,
    cursor: CursorStyle,
    pending_menu: Option<ContextMenuRequest>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the size a widget will have once placed.
    pub fn declare(&mut self, widget: WidgetId, size: Size) {
        self.sizes.insert(widget, size);
    }

    /// Placed widgets, ordered by id.
    pub fn rects(&self) -> impl Iterator<Item = (WidgetId, Rect)> + '_ {
        self.rects.iter().map(|(w, r)| (*w, *r))
    }

    pub fn highlighted(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.highlighted.iter().copied()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Take the last contextual menu request, if one is open.
    pub fn take_menu(&mut self) -> Option<ContextMenuRequest> {
        self.pending_menu.take()
    }
}

impl WidgetHost for ScriptHost {
    fn place(&mut self, widget: WidgetId, x: f64, y: f64) {
        let size = self
            .rects
            .get(&widget)
            .map(|r| r.size())
            .or_else(|| self.sizes.get(&widget).copied())
            .unwrap_or(Size::ZERO);
        self.rects.insert(widget, Rect::from_origin_size((x, y), size));
    }

    fn remove(&mut self, widget: WidgetId) {
        self.rects.remove(&widget);
        self.highlighted.remove(&widget);
        log::debug!("Removed {}", widget);
    }

    fn bounding_rectangle_of(&self, widget: WidgetId) -> Option<Rect> {
        self.rects.get(&widget).copied()
    }

    fn set_highlighted(&mut self, widget: WidgetId, highlighted: bool) {
        if highlighted {
            self.highlighted.insert(widget);
        } else {
            self.highlighted.remove(&widget);
        }
        log::debug!("{} highlighted: {}", widget, highlighted);
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
        log::debug!("Cursor: {:?}", cursor);
    }

    fn open_context_menu(&mut self, request: ContextMenuRequest) {
        log::info!(
            "Context menu for connection {} at ({}, {})",
            request.connection,
            request.position.x,
            request.position.y
        );
        self.pending_menu = Some(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_keeps_size() {
        let mut host = ScriptHost::new();
        host.declare(WidgetId(1), Size::new(50.0, 30.0));
        host.place(WidgetId(1), 10.0, 10.0);
        assert_eq!(host.bounding_rectangle_of(WidgetId(1)), Some(Rect::new(10.0, 10.0, 60.0, 40.0)));

        host.place(WidgetId(1), 0.0, 0.0);
        assert_eq!(host.bounding_rectangle_of(WidgetId(1)), Some(Rect::new(0.0, 0.0, 50.0, 30.0)));

        host.remove(WidgetId(1));
        assert_eq!(host.bounding_rectangle_of(WidgetId(1)), None);
    }

    #[test]
    fn test_highlight_and_cursor() {
        let mut host = ScriptHost::new();
        host.set_highlighted(WidgetId(2), true);
        host.set_cursor(CursorStyle::Pointer);
        assert_eq!(host.highlighted().collect::<Vec<_>>(), vec![WidgetId(2)]);
        assert_eq!(host.cursor(), CursorStyle::Pointer);

        host.set_highlighted(WidgetId(2), false);
        assert_eq!(host.highlighted().count(), 0);
    }
}
