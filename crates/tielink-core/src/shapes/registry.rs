//! Registry of tracked widget shapes.

use super::{AnchoredShape, ShapeId, WidgetId};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// Arena of connectable shapes keyed by stable handles.
///
/// Host widgets are looked up through `widgets`, so the controller never
/// compares widget references directly.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    /// All tracked shapes, keyed by handle.
    shapes: HashMap<ShapeId, AnchoredShape>,
    /// Widget handle to shape handle.
    widgets: HashMap<WidgetId, ShapeId>,
    /// Registration order, used for scan order.
    order: Vec<ShapeId>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a widget, returning its shape handle.
    ///
    /// Registering a widget twice keeps the existing handle and only updates
    /// the cached rectangle.
    pub fn register(&mut self, widget: WidgetId, rect: Rect) -> ShapeId {
        if let Some(&id) = self.widgets.get(&widget) {
            if let Some(shape) = self.shapes.get_mut(&id) {
                shape.set_rect(rect);
            }
            return id;
        }
        let shape = AnchoredShape::new(widget, rect);
        let id = shape.id();
        self.widgets.insert(widget, id);
        self.order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Stop tracking a widget.
    pub fn unregister(&mut self, widget: WidgetId) -> Option<AnchoredShape> {
        let id = self.widgets.remove(&widget)?;
        self.order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&AnchoredShape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut AnchoredShape> {
        self.shapes.get_mut(&id)
    }

    pub fn id_of(&self, widget: WidgetId) -> Option<ShapeId> {
        self.widgets.get(&widget).copied()
    }

    pub fn widget_of(&self, id: ShapeId) -> Option<WidgetId> {
        self.shapes.get(&id).map(|s| s.widget)
    }

    /// Shapes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchoredShape> {
        self.order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Widget handles in registration order.
    pub fn widgets(&self) -> Vec<WidgetId> {
        self.iter().map(|s| s.widget).collect()
    }

    /// Refresh every cached rectangle from a lookup.
    ///
    /// Shapes whose widget the lookup no longer knows keep their last
    /// rectangle.
    pub fn sync_rects(&mut self, mut lookup: impl FnMut(WidgetId) -> Option<Rect>) {
        for shape in self.shapes.values_mut() {
            match lookup(shape.widget) {
                Some(rect) => shape.set_rect(rect),
                None => log::warn!("No placement for tracked {}", shape.widget),
            }
        }
    }

    /// First shape whose border zone contains `point`.
    pub fn shape_near_selectable_area(&self, point: Point, margin: f64) -> Option<ShapeId> {
        self.iter()
            .find(|s| s.is_near_selectable_area(point, margin))
            .map(|s| s.id())
    }

    /// First shape whose rectangle contains `point`.
    pub fn shape_under(&self, point: Point) -> Option<ShapeId> {
        self.iter().find(|s| s.contains(point)).map(|s| s.id())
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.widgets.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
