//! Interaction controller: the per-tick state machine.
//!
//! The host calls [`DiagramController::tick`] once per
//! [`ControllerConfig::refresh_rate_ms`] and forwards pointer events as they
//! arrive. Pointer events only record the pointer and flip the interaction
//! state; geometry, drawing and hover detection all happen in `tick`.
//!
//! Two drag axes exist, building a new connection and dragging a waypoint.
//! They are variants of one [`InteractionState`], so at most one is active.

use crate::config::ControllerConfig;
use crate::connection::{Connection, ConnectionId, MovablePoint, WaypointCandidate};
use crate::error::{DiagramError, DiagramResult};
use crate::events::{DiagramEvent, EventBus, ListenerId};
use crate::frame_rate::{FrameCounter, Instant};
use crate::host::{
    ContextAction, ContextMenuRequest, CursorStyle, SegmentStyle, Surface, WidgetHost,
};
use crate::input::{PointerButton, PointerEvent};
use crate::shapes::{
    DecorationShape, MouseShape, Shape, ShapeId, ShapeRef, ShapeRegistry, WidgetId,
};
use kurbo::{Point, Rect, Size};

/// Coarse interaction phase, for queries and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    HoverShape,
    Building,
    HoverPoint,
    DraggingPoint,
}

/// Interaction state owned by the controller.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Pointer is on the border zone of a shape; pressing starts a connection.
    HoverShape { shape: ShapeId },
    /// A provisional connection follows the pointer.
    Building {
        start: ShapeId,
        connection: Box<Connection>,
    },
    /// Pointer is on a path; pressing inserts a waypoint at `candidate`.
    HoverPoint {
        connection: ConnectionId,
        candidate: WaypointCandidate,
    },
    /// A waypoint follows the pointer.
    DraggingPoint { point: MovablePoint },
}

impl InteractionState {
    pub fn phase(&self) -> Phase {
        match self {
            InteractionState::Idle => Phase::Idle,
            InteractionState::HoverShape { .. } => Phase::HoverShape,
            InteractionState::Building { .. } => Phase::Building,
            InteractionState::HoverPoint { .. } => Phase::HoverPoint,
            InteractionState::DraggingPoint { .. } => Phase::DraggingPoint,
        }
    }
}

/// Owns the diagram and drives its collaborators.
pub struct DiagramController<S: Surface, H: WidgetHost> {
    config: ControllerConfig,
    surface: S,
    host: H,
    shapes: ShapeRegistry,
    /// Committed connections, in creation order.
    connections: Vec<Connection>,
    state: InteractionState,
    /// Last known pointer position.
    pointer: Point,
    events: EventBus,
    frames: FrameCounter,
    show_grid: bool,
    /// Widget currently highlighted as a drop target.
    highlighted: Option<WidgetId>,
    cursor: CursorStyle,
}

impl<S: Surface, H: WidgetHost> std::fmt::Debug for DiagramController<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramController")
            .field("shapes", &self.shapes.len())
            .field("connections", &self.connections.len())
            .field("phase", &self.state.phase())
            .field("pointer", &self.pointer)
            .finish()
    }
}

impl<S: Surface, H: WidgetHost> DiagramController<S, H> {
    pub fn new(surface: S, host: H) -> Self {
        Self::with_config(ControllerConfig::default(), surface, host)
    }

    pub fn with_config(config: ControllerConfig, surface: S, host: H) -> Self {
        Self {
            config,
            surface,
            host,
            shapes: ShapeRegistry::new(),
            connections: Vec::new(),
            state: InteractionState::Idle,
            pointer: Point::ZERO,
            events: EventBus::new(),
            frames: FrameCounter::new(),
            show_grid: false,
            highlighted: None,
            cursor: CursorStyle::Default,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id() == id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection being dragged out, if any.
    pub fn provisional_connection(&self) -> Option<&Connection> {
        match &self.state {
            InteractionState::Building { connection, .. } => Some(&**connection),
            _ => None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_building(&self) -> bool {
        self.phase() == Phase::Building
    }

    pub fn is_dragging_point(&self) -> bool {
        self.phase() == Phase::DraggingPoint
    }

    pub fn is_hovering_shape(&self) -> bool {
        self.phase() == Phase::HoverShape
    }

    pub fn is_hovering_point(&self) -> bool {
        self.phase() == Phase::HoverPoint
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&DiagramEvent) + 'static) -> ListenerId {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    pub fn is_show_grid(&self) -> bool {
        self.show_grid
    }

    /// Close the frame-rate window; call every `frame_rate_interval_ms`.
    pub fn measure_frame_rate(&mut self, now: Instant) -> u64 {
        self.frames.measure(now)
    }

    /// Ticks per second over the last measurement window.
    pub fn fps(&self) -> u64 {
        self.frames.fps()
    }

    // ---------------------------------------------------------------------
    // Diagram editing
    // ---------------------------------------------------------------------

    /// Place a widget on the surface and start tracking it.
    pub fn add_widget(&mut self, widget: WidgetId, left: f64, top: f64) -> ShapeId {
        self.host.place(widget, left, top);
        let rect = self
            .host
            .bounding_rectangle_of(widget)
            .unwrap_or_else(|| Rect::from_origin_size((left, top), Size::ZERO));
        let id = self.shapes.register(widget, rect);
        log::debug!("Tracking {} as shape {}", widget, id);
        self.events.emit(DiagramEvent::DiagramChanged);
        id
    }

    /// Untie every connection of a widget, then stop tracking and remove it.
    ///
    /// A decoration widget is detached from its connection instead.
    pub fn remove_widget(&mut self, widget: WidgetId) -> DiagramResult<()> {
        if let Some(owner) = self.decoration_owner(widget) {
            self.remove_decoration(owner)?;
            return Ok(());
        }

        let id = self
            .shapes
            .id_of(widget)
            .ok_or(DiagramError::UnknownWidget(widget))?;

        let attached: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.touches(ShapeRef::Tracked(id)))
            .map(|c| c.id())
            .collect();
        for connection in attached {
            self.delete_connection(connection)?;
        }

        let involved = match &self.state {
            InteractionState::HoverShape { shape } => *shape == id,
            InteractionState::Building { start, .. } => *start == id,
            _ => false,
        };
        if involved {
            self.reset_interaction();
        }
        if self.highlighted == Some(widget) {
            self.highlighted = None;
        }

        self.shapes.unregister(widget);
        self.host.remove(widget);
        self.events.emit(DiagramEvent::DiagramChanged);
        Ok(())
    }

    /// Shape standing for a widget: a tracked shape or a connection decoration.
    pub fn shape_of(&self, widget: WidgetId) -> Option<Shape> {
        if let Some(shape) = self.shapes.id_of(widget).and_then(|id| self.shapes.get(id)) {
            return Some(Shape::Anchored(shape.clone()));
        }
        self.connections
            .iter()
            .filter_map(|c| c.decoration())
            .find(|d| d.widget == widget)
            .cloned()
            .map(Shape::Decoration)
    }

    fn decoration_owner(&self, widget: WidgetId) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| c.decoration().is_some_and(|d| d.widget == widget))
            .map(|c| c.id())
    }

    /// Connect two widgets with a plain straight connection.
    pub fn draw_straight_connection(
        &mut self,
        start: WidgetId,
        end: WidgetId,
    ) -> DiagramResult<ConnectionId> {
        self.connect(start, end, false)
    }

    /// Connect two widgets with a straight connection ending in an arrow.
    pub fn draw_straight_arrow_connection(
        &mut self,
        start: WidgetId,
        end: WidgetId,
    ) -> DiagramResult<ConnectionId> {
        self.connect(start, end, true)
    }

    fn connect(&mut self, start: WidgetId, end: WidgetId, arrow: bool) -> DiagramResult<ConnectionId> {
        if start == end {
            return Err(DiagramError::SelfConnection(start));
        }
        let start_id = self.ensure_tracked(start)?;
        let end_id = self.ensure_tracked(end)?;
        let id = self.tie(start_id, end_id, arrow)?;
        self.events.emit(DiagramEvent::DiagramChanged);
        Ok(id)
    }

    /// Shape handle of a widget, registering it from the host if needed.
    fn ensure_tracked(&mut self, widget: WidgetId) -> DiagramResult<ShapeId> {
        if let Some(id) = self.shapes.id_of(widget) {
            return Ok(id);
        }
        let rect = self
            .host
            .bounding_rectangle_of(widget)
            .ok_or(DiagramError::UnknownWidget(widget))?;
        Ok(self.shapes.register(widget, rect))
    }

    /// Create and store a committed connection between two tracked shapes.
    fn tie(&mut self, start: ShapeId, end: ShapeId, arrow: bool) -> DiagramResult<ConnectionId> {
        let start_shape = self.tracked_shape(start)?;
        let end_shape = self.tracked_shape(end)?;
        let connection = Connection::new(
            ShapeRef::Tracked(start),
            &start_shape,
            ShapeRef::Tracked(end),
            &end_shape,
            arrow,
        );
        let id = connection.id();
        self.connections.push(connection);
        Ok(id)
    }

    fn tracked_shape(&self, id: ShapeId) -> DiagramResult<Shape> {
        self.shapes
            .get(id)
            .cloned()
            .map(Shape::Anchored)
            .ok_or(DiagramError::UnknownShape(id))
    }

    /// Remove a connection, disposing its decoration, and notify listeners.
    pub fn delete_connection(&mut self, id: ConnectionId) -> DiagramResult<Connection> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id() == id)
            .ok_or(DiagramError::UnknownConnection(id))?;
        let mut connection = self.connections.remove(index);

        if let Some(decoration) = connection.detach_decoration() {
            self.host.remove(decoration.widget);
        }

        let involved = match &self.state {
            InteractionState::HoverPoint { connection, .. } => *connection == id,
            InteractionState::DraggingPoint { point } => point.connection() == id,
            _ => false,
        };
        if involved {
            self.reset_interaction();
        }

        let ends = connection
            .start()
            .tracked()
            .and_then(|s| self.shapes.widget_of(s))
            .zip(connection.end().tracked().and_then(|e| self.shapes.widget_of(e)));
        if let Some((start, end)) = ends {
            log::info!("Untied {} from {}", start, end);
            self.events.emit(DiagramEvent::LinkUntied {
                start,
                end,
                connection: id,
            });
        }
        self.events.emit(DiagramEvent::DiagramChanged);
        Ok(connection)
    }

    /// Drop every waypoint of a connection.
    pub fn set_straight_connection(&mut self, id: ConnectionId) -> DiagramResult<()> {
        let pointer = self.pointer;
        let connection = self
            .connections
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(DiagramError::UnknownConnection(id))?;
        match (
            resolve(&self.shapes, pointer, connection.start()),
            resolve(&self.shapes, pointer, connection.end()),
        ) {
            (Some(start), Some(end)) => connection.toggle_straight(&start, &end),
            _ => log::warn!("Connection {} has an unresolved endpoint", id),
        }

        if matches!(&self.state, InteractionState::DraggingPoint { point } if point.connection() == id)
        {
            self.reset_interaction();
        }
        self.events.emit(DiagramEvent::DiagramChanged);
        Ok(())
    }

    /// Attach a decoration widget to the middle of a connection.
    ///
    /// A decoration already on the connection is removed from the host.
    pub fn add_decoration(&mut self, widget: WidgetId, connection: ConnectionId) -> DiagramResult<()> {
        let target = self
            .connections
            .iter_mut()
            .find(|c| c.id() == connection)
            .ok_or(DiagramError::UnknownConnection(connection))?;
        let midpoint = target.path().midpoint();
        let previous = target.attach_decoration(DecorationShape::new(widget, midpoint));
        if let Some(previous) = previous {
            self.host.remove(previous.widget);
        }
        if let Some(decoration) = target.layout_decoration() {
            place_centered(&mut self.host, decoration);
        }
        self.events.emit(DiagramEvent::DiagramChanged);
        Ok(())
    }

    /// Detach and dispose the decoration of a connection.
    pub fn remove_decoration(&mut self, connection: ConnectionId) -> DiagramResult<Option<WidgetId>> {
        let target = self
            .connections
            .iter_mut()
            .find(|c| c.id() == connection)
            .ok_or(DiagramError::UnknownConnection(connection))?;
        let removed = target.detach_decoration().map(|d| d.widget);
        if let Some(widget) = removed {
            self.host.remove(widget);
            self.events.emit(DiagramEvent::DiagramChanged);
        }
        Ok(removed)
    }

    /// Run an action chosen from a connection's contextual menu.
    pub fn apply_context_action(
        &mut self,
        request: ContextMenuRequest,
        action: ContextAction,
    ) -> DiagramResult<()> {
        match action {
            ContextAction::Delete => self.delete_connection(request.connection).map(|_| ()),
            ContextAction::SetStraight => self.set_straight_connection(request.connection),
        }
    }

    /// First connection whose path passes near the pointer.
    pub fn connection_near_pointer(&self) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| c.is_near_pointer(self.pointer, self.config.min_distance_to_segment))
            .map(|c| c.id())
    }

    /// Remove every widget and connection and drop any in-progress drag.
    pub fn clear_diagram(&mut self) {
        for connection in &mut self.connections {
            if let Some(decoration) = connection.detach_decoration() {
                self.host.remove(decoration.widget);
            }
        }
        for widget in self.shapes.widgets() {
            self.host.remove(widget);
        }
        self.connections.clear();
        self.shapes.clear();
        self.state = InteractionState::Idle;
        self.highlighted = None;
        self.set_cursor(CursorStyle::Default);
        log::info!("Diagram cleared");
        self.events.emit(DiagramEvent::DiagramChanged);
    }

    // ---------------------------------------------------------------------
    // Pointer events
    // ---------------------------------------------------------------------

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move { position } => self.on_pointer_move(position.x, position.y),
            PointerEvent::Down { position, button } => {
                self.on_pointer_down(button, position.x, position.y)
            }
            PointerEvent::Up { position, button } => {
                self.on_pointer_up(button, position.x, position.y)
            }
        }
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.pointer = Point::new(x, y);
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, x: f64, y: f64) {
        self.pointer = Point::new(x, y);

        if button == PointerButton::Secondary {
            if let Some(connection) = self.connection_near_pointer() {
                log::debug!("Context menu for connection {}", connection);
                self.host.open_context_menu(ContextMenuRequest {
                    connection,
                    position: self.pointer,
                });
            }
            return;
        }

        match std::mem::take(&mut self.state) {
            InteractionState::HoverShape { shape } => self.begin_build(shape),
            InteractionState::HoverPoint {
                connection,
                candidate,
            } => self.begin_drag(connection, candidate),
            other => self.state = other,
        }
    }

    pub fn on_pointer_up(&mut self, button: PointerButton, x: f64, y: f64) {
        self.pointer = Point::new(x, y);
        if button == PointerButton::Secondary {
            return;
        }

        match std::mem::take(&mut self.state) {
            InteractionState::DraggingPoint { mut point } => {
                point.fix(self.pointer);
                if let Some(c) = self
                    .connections
                    .iter_mut()
                    .find(|c| c.id() == point.connection())
                {
                    c.apply_movable_point(&point);
                }
                log::debug!("Waypoint fixed at {:?}", point.position());
                self.set_cursor(CursorStyle::Default);
                self.events.emit(DiagramEvent::DiagramChanged);
            }
            InteractionState::Building { start, .. } => {
                self.finish_build(start);
            }
            InteractionState::HoverPoint { .. } => {
                self.set_cursor(CursorStyle::Default);
            }
            other => self.state = other,
        }
    }

    fn begin_build(&mut self, start: ShapeId) {
        let Some(start_shape) = self.shapes.get(start).cloned().map(Shape::Anchored) else {
            self.transition(InteractionState::Idle);
            return;
        };
        let mouse = MouseShape::new(self.pointer);
        let connection = Connection::new(
            ShapeRef::Tracked(start),
            &start_shape,
            ShapeRef::Pointer,
            &mouse,
            true,
        );
        self.transition(InteractionState::Building {
            start,
            connection: Box::new(connection),
        });
    }

    fn finish_build(&mut self, start: ShapeId) {
        let target = self.shapes.shape_under(self.pointer).filter(|t| *t != start);
        if let Some(end) = target {
            match self.tie(start, end, true) {
                Ok(id) => {
                    let widgets = self.shapes.widget_of(start).zip(self.shapes.widget_of(end));
                    if let Some((start, end)) = widgets {
                        log::info!("Tied {} to {}", start, end);
                        self.events.emit(DiagramEvent::LinkTied {
                            start,
                            end,
                            connection: id,
                        });
                    }
                    self.events.emit(DiagramEvent::DiagramChanged);
                }
                Err(e) => log::warn!("Could not commit connection: {}", e),
            }
        } else {
            log::debug!("Provisional connection discarded");
        }
        self.set_highlight(None);
        self.set_cursor(CursorStyle::Default);
        self.transition(InteractionState::Idle);
    }

    fn begin_drag(&mut self, connection: ConnectionId, candidate: WaypointCandidate) {
        let Some(target) = self.connections.iter_mut().find(|c| c.id() == connection) else {
            self.transition(InteractionState::Idle);
            return;
        };
        let mut point = target.add_movable_point(candidate);
        point.track(self.pointer);
        target.apply_movable_point(&point);
        self.transition(InteractionState::DraggingPoint { point });
    }

    // ---------------------------------------------------------------------
    // Tick
    // ---------------------------------------------------------------------

    /// Run one update: sync geometry, redraw, and re-evaluate hover.
    pub fn tick(&mut self) {
        self.frames.frame();

        let host = &self.host;
        self.shapes.sync_rects(|widget| host.bounding_rectangle_of(widget));

        if let InteractionState::DraggingPoint { point } = &mut self.state {
            point.track(self.pointer);
            let point = *point;
            if let Some(c) = self
                .connections
                .iter_mut()
                .find(|c| c.id() == point.connection())
            {
                c.apply_movable_point(&point);
            }
        }

        self.refresh_paths();
        self.draw();
        self.update_hover();
    }

    fn refresh_paths(&mut self) {
        let pointer = self.pointer;
        let provisional = match &mut self.state {
            InteractionState::Building { connection, .. } => Some(connection.as_mut()),
            _ => None,
        };
        for connection in self.connections.iter_mut().chain(provisional) {
            match (
                resolve(&self.shapes, pointer, connection.start()),
                resolve(&self.shapes, pointer, connection.end()),
            ) {
                (Some(start), Some(end)) => connection.refresh(&start, &end),
                _ => log::warn!("Connection {} has an unresolved endpoint", connection.id()),
            }
        }
    }

    fn draw(&mut self) {
        self.surface.clear_surface();
        if self.show_grid {
            self.surface.draw_grid(self.config.grid_spacing);
        }

        let style = SegmentStyle::committed();
        for connection in &mut self.connections {
            connection.render(
                &mut self.surface,
                &style,
                self.config.arrow_head_size,
                self.config.curve_tolerance,
            );
            if let Some(decoration) = connection.layout_decoration() {
                place_centered(&mut self.host, decoration);
            }
        }

        if let InteractionState::Building { connection, .. } = &self.state {
            connection.render(
                &mut self.surface,
                &SegmentStyle::provisional(),
                self.config.arrow_head_size,
                self.config.curve_tolerance,
            );
        }
    }

    fn update_hover(&mut self) {
        match self.state.phase() {
            Phase::Building => {
                // Dragging a new connection suppresses every other hover scan.
                let under = self
                    .shapes
                    .shape_under(self.pointer)
                    .and_then(|id| self.shapes.widget_of(id));
                self.set_highlight(under);
                self.set_cursor(CursorStyle::Default);
                return;
            }
            Phase::DraggingPoint => {
                self.set_cursor(CursorStyle::Pointer);
                return;
            }
            _ => {}
        }

        // Shapes win over paths.
        if let Some(shape) = self
            .shapes
            .shape_near_selectable_area(self.pointer, self.config.selectable_margin)
        {
            if let Some(rect) = self.shapes.get(shape).map(|s| s.rect) {
                self.surface.draw_selectable_area(rect);
            }
            self.transition(InteractionState::HoverShape { shape });
            self.set_cursor(CursorStyle::Pointer);
            return;
        }

        let near = self
            .connections
            .iter()
            .find(|c| c.is_near_pointer(self.pointer, self.config.min_distance_to_segment))
            .map(|c| (c.id(), c.nearest_segment_midpoint_for(self.pointer)));
        if let Some((connection, candidate)) = near {
            self.surface.draw_point_marker(candidate.position);
            self.transition(InteractionState::HoverPoint {
                connection,
                candidate,
            });
            self.set_cursor(CursorStyle::Pointer);
            return;
        }

        self.transition(InteractionState::Idle);
        self.set_cursor(CursorStyle::Default);
    }

    fn transition(&mut self, next: InteractionState) {
        let (from, to) = (self.state.phase(), next.phase());
        if from != to {
            log::debug!("Interaction {:?} -> {:?}", from, to);
        }
        self.state = next;
    }

    fn reset_interaction(&mut self) {
        self.transition(InteractionState::Idle);
        self.set_highlight(None);
        self.set_cursor(CursorStyle::Default);
    }

    fn set_highlight(&mut self, widget: Option<WidgetId>) {
        if self.highlighted == widget {
            return;
        }
        if let Some(old) = self.highlighted {
            self.host.set_highlighted(old, false);
        }
        if let Some(new) = widget {
            self.host.set_highlighted(new, true);
        }
        self.highlighted = widget;
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        if self.cursor != cursor {
            self.host.set_cursor(cursor);
            self.cursor = cursor;
        }
    }
}

/// Turn a connection endpoint into a concrete shape.
fn resolve(shapes: &ShapeRegistry, pointer: Point, shape: ShapeRef) -> Option<Shape> {
    match shape {
        ShapeRef::Tracked(id) => shapes.get(id).cloned().map(Shape::Anchored),
        ShapeRef::Pointer => Some(Shape::Mouse(MouseShape::new(pointer))),
    }
}

/// Place a decoration widget so that its centre sits on the decoration point.
fn place_centered(host: &mut impl WidgetHost, decoration: &DecorationShape) {
    let size = host
        .bounding_rectangle_of(decoration.widget)
        .map(|r| r.size())
        .unwrap_or(Size::ZERO);
    host.place(
        decoration.widget,
        decoration.position.x - size.width / 2.0,
        decoration.position.y - size.height / 2.0,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionStyle;
    use crate::shapes::ShapeTrait;
    use kurbo::Vec2;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;
    use std::time::Duration;

    const S1: WidgetId = WidgetId(1);
    const S2: WidgetId = WidgetId(2);
    const DECO: WidgetId = WidgetId(9);

    #[derive(Default)]
    struct TestSurface {
        clears: usize,
        grids: usize,
        segments: Vec<(Point, Point, bool)>,
        arrows: Vec<Point>,
        markers: Vec<Point>,
        areas: Vec<Rect>,
    }

    impl Surface for TestSurface {
        fn clear_surface(&mut self) {
            self.clears += 1;
            self.segments.clear();
            self.arrows.clear();
            self.markers.clear();
            self.areas.clear();
        }

        fn draw_segment(&mut self, p1: Point, p2: Point, style: &SegmentStyle) {
            self.segments.push((p1, p2, style.provisional));
        }

        fn draw_arrowhead(&mut self, at: Point, _direction: Vec2, _size: f64, _style: &SegmentStyle) {
            self.arrows.push(at);
        }

        fn draw_grid(&mut self, _spacing: f64) {
            self.grids += 1;
        }

        fn draw_point_marker(&mut self, at: Point) {
            self.markers.push(at);
        }

        fn draw_selectable_area(&mut self, rect: Rect) {
            self.areas.push(rect);
        }
    }

    #[derive(Default)]
    struct TestHost {
        rects: HashMap<WidgetId, Rect>,
        sizes: HashMap<WidgetId, Size>,
        removed: Vec<WidgetId>,
        highlighted: HashSet<WidgetId>,
        cursor: CursorStyle,
        menus: Vec<ContextMenuRequest>,
    }

    impl TestHost {
        fn with_size(mut self, widget: WidgetId, width: f64, height: f64) -> Self {
            self.sizes.insert(widget, Size::new(width, height));
            self
        }
    }

    impl WidgetHost for TestHost {
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
            self.removed.push(widget);
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
        }

        fn set_cursor(&mut self, cursor: CursorStyle) {
            self.cursor = cursor;
        }

        fn open_context_menu(&mut self, request: ContextMenuRequest) {
            self.menus.push(request);
        }
    }

    type TestController = DiagramController<TestSurface, TestHost>;

    /// S1 at (0,0)-(50,30), S2 at (200,0)-(250,30).
    fn controller() -> TestController {
        let host = TestHost::default()
            .with_size(S1, 50.0, 30.0)
            .with_size(S2, 50.0, 30.0)
            .with_size(DECO, 20.0, 10.0);
        let mut c = DiagramController::new(TestSurface::default(), host);
        c.add_widget(S1, 0.0, 0.0);
        c.add_widget(S2, 200.0, 0.0);
        c
    }

    fn record_events(c: &mut TestController) -> Rc<RefCell<Vec<DiagramEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        c.add_listener(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    fn move_and_tick(c: &mut TestController, x: f64, y: f64) {
        c.on_pointer_move(x, y);
        c.tick();
    }

    fn ties(events: &RefCell<Vec<DiagramEvent>>) -> Vec<DiagramEvent> {
        events
            .borrow()
            .iter()
            .filter(|e| matches!(e, DiagramEvent::LinkTied { .. }))
            .cloned()
            .collect()
    }

    #[test]
    fn test_build_connection_between_shapes() {
        let mut c = controller();
        let events = record_events(&mut c);

        move_and_tick(&mut c, 48.0, 15.0);
        assert_eq!(c.phase(), Phase::HoverShape);
        assert_eq!(c.host().cursor, CursorStyle::Pointer);
        assert_eq!(c.surface().areas, vec![Rect::new(0.0, 0.0, 50.0, 30.0)]);

        c.on_pointer_down(PointerButton::Primary, 48.0, 15.0);
        assert!(c.is_building());
        assert!(c.provisional_connection().is_some());

        move_and_tick(&mut c, 220.0, 15.0);
        assert!(c.is_building());
        assert!(c.host().highlighted.contains(&S2));
        assert_eq!(c.provisional_connection().map(|p| p.path().last()), Some(Point::new(220.0, 15.0)));
        assert!(c.surface().segments.iter().any(|(_, _, provisional)| *provisional));

        c.on_pointer_up(PointerButton::Primary, 220.0, 15.0);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.provisional_connection().is_none());
        assert_eq!(c.connection_count(), 1);
        assert!(c.host().highlighted.is_empty());

        let committed = c.connections().next().unwrap();
        assert_eq!(committed.path().points(), &[Point::new(50.0, 15.0), Point::new(200.0, 15.0)]);
        assert_eq!(committed.style(), ConnectionStyle::Straight);
        assert_eq!(
            ties(&events),
            vec![DiagramEvent::LinkTied {
                start: S1,
                end: S2,
                connection: committed.id(),
            }]
        );
    }

    #[test]
    fn test_build_released_over_nothing_is_discarded() {
        let mut c = controller();
        let events = record_events(&mut c);

        move_and_tick(&mut c, 48.0, 15.0);
        c.on_pointer_down(PointerButton::Primary, 48.0, 15.0);
        move_and_tick(&mut c, 120.0, 200.0);
        c.on_pointer_up(PointerButton::Primary, 120.0, 200.0);

        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.connection_count(), 0);
        assert!(ties(&events).is_empty());
    }

    #[test]
    fn test_build_released_over_start_shape_is_discarded() {
        let mut c = controller();
        let events = record_events(&mut c);

        move_and_tick(&mut c, 48.0, 15.0);
        c.on_pointer_down(PointerButton::Primary, 48.0, 15.0);
        move_and_tick(&mut c, 25.0, 15.0);
        assert!(c.host().highlighted.contains(&S1));
        c.on_pointer_up(PointerButton::Primary, 25.0, 15.0);

        assert_eq!(c.connection_count(), 0);
        assert!(ties(&events).is_empty());
        assert!(c.host().highlighted.is_empty());
    }

    #[test]
    fn test_drag_waypoint_then_straighten() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();

        move_and_tick(&mut c, 125.0, 15.0);
        assert_eq!(c.phase(), Phase::HoverPoint);
        assert_eq!(c.surface().markers, vec![Point::new(125.0, 15.0)]);

        c.on_pointer_down(PointerButton::Primary, 125.0, 15.0);
        assert!(c.is_dragging_point());
        assert!(!c.is_building());
        assert_eq!(c.connection(id).map(|k| k.path().len()), Some(3));

        move_and_tick(&mut c, 125.0, 60.0);
        let path = c.connection(id).unwrap().path().clone();
        assert_eq!(path.interior_points(), &[Point::new(125.0, 60.0)]);
        assert_eq!(path.first(), Point::new(50.0, 30.0));
        assert_eq!(path.last(), Point::new(200.0, 30.0));

        c.on_pointer_up(PointerButton::Primary, 125.0, 60.0);
        assert_eq!(c.phase(), Phase::Idle);
        let connection = c.connection(id).unwrap();
        assert_eq!(connection.path().len(), 3);
        assert_eq!(connection.path().interior_points(), &[Point::new(125.0, 60.0)]);
        assert_eq!(connection.style(), ConnectionStyle::Curved);

        c.set_straight_connection(id).unwrap();
        let connection = c.connection(id).unwrap();
        assert_eq!(connection.path().len(), 2);
        assert_eq!(connection.style(), ConnectionStyle::Straight);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut c = controller();
        c.draw_straight_connection(S1, S2).unwrap();
        move_and_tick(&mut c, 48.0, 15.0);
        c.on_pointer_down(PointerButton::Primary, 48.0, 15.0);
        move_and_tick(&mut c, 100.0, 100.0);
        assert!(c.is_building());

        c.clear_diagram();

        assert_eq!(c.connection_count(), 0);
        assert!(c.shapes().is_empty());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.provisional_connection().is_none());
        assert!(c.host().removed.contains(&S1));
        assert!(c.host().removed.contains(&S2));
        assert_eq!(c.cursor(), CursorStyle::Default);
    }

    #[test]
    fn test_clear_while_dragging_point() {
        let mut c = controller();
        c.draw_straight_connection(S1, S2).unwrap();
        move_and_tick(&mut c, 125.0, 15.0);
        c.on_pointer_down(PointerButton::Primary, 125.0, 15.0);
        assert!(c.is_dragging_point());

        c.clear_diagram();
        assert_eq!(c.phase(), Phase::Idle);

        // A late release has nothing to finish.
        c.on_pointer_up(PointerButton::Primary, 10.0, 10.0);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.connection_count(), 0);
    }

    #[test]
    fn test_shape_hover_wins_over_path_hover() {
        let mut c = controller();
        c.draw_straight_connection(S1, S2).unwrap();

        // On the path and inside S1's border zone at once.
        move_and_tick(&mut c, 55.0, 15.0);
        assert_eq!(c.phase(), Phase::HoverShape);
        assert!(c.surface().markers.is_empty());
    }

    #[test]
    fn test_building_suppresses_path_hover() {
        let mut c = controller();
        c.draw_straight_connection(S1, S2).unwrap();

        move_and_tick(&mut c, 25.0, 2.0);
        assert_eq!(c.phase(), Phase::HoverShape);
        c.on_pointer_down(PointerButton::Primary, 25.0, 2.0);

        move_and_tick(&mut c, 125.0, 15.0);
        assert!(c.is_building());
        assert!(c.surface().markers.is_empty());
        assert!(!c.is_dragging_point());
    }

    #[test]
    fn test_hover_leaves_back_to_idle() {
        let mut c = controller();
        move_and_tick(&mut c, 48.0, 15.0);
        assert_eq!(c.host().cursor, CursorStyle::Pointer);

        move_and_tick(&mut c, 120.0, 200.0);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.host().cursor, CursorStyle::Default);

        // Pressing while idle does nothing.
        c.on_pointer_down(PointerButton::Primary, 120.0, 200.0);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_context_menu_delete() {
        let mut c = controller();
        let events = record_events(&mut c);
        let id = c.draw_straight_connection(S1, S2).unwrap();

        c.on_pointer_down(PointerButton::Secondary, 125.0, 18.0);
        assert_eq!(c.phase(), Phase::Idle);
        let request = c.host().menus[0];
        assert_eq!(request.connection, id);
        assert_eq!(request.position, Point::new(125.0, 18.0));

        c.apply_context_action(request, ContextAction::Delete).unwrap();
        assert_eq!(c.connection_count(), 0);
        assert!(events.borrow().contains(&DiagramEvent::LinkUntied {
            start: S1,
            end: S2,
            connection: id,
        }));
        assert_eq!(
            c.apply_context_action(request, ContextAction::Delete),
            Err(DiagramError::UnknownConnection(id))
        );
    }

    #[test]
    fn test_context_menu_away_from_connections() {
        let mut c = controller();
        c.draw_straight_connection(S1, S2).unwrap();
        c.on_pointer_down(PointerButton::Secondary, 125.0, 80.0);
        assert!(c.host().menus.is_empty());
    }

    #[test]
    fn test_context_menu_set_straight() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();
        move_and_tick(&mut c, 125.0, 15.0);
        c.on_pointer_down(PointerButton::Primary, 125.0, 15.0);
        move_and_tick(&mut c, 125.0, 60.0);
        c.on_pointer_up(PointerButton::Primary, 125.0, 60.0);

        c.on_pointer_down(PointerButton::Secondary, 90.0, 45.0);
        let request = c.host().menus[0];
        c.apply_context_action(request, ContextAction::SetStraight).unwrap();
        assert_eq!(c.connection(id).map(|k| k.path().len()), Some(2));
    }

    #[test]
    fn test_decoration_follows_connection_and_is_disposed() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();
        c.add_decoration(DECO, id).unwrap();
        c.tick();

        assert_eq!(c.host().bounding_rectangle_of(DECO), Some(Rect::new(115.0, 10.0, 135.0, 20.0)));
        assert_eq!(c.connection(id).and_then(|k| k.decoration()).map(|d| d.widget), Some(DECO));

        c.delete_connection(id).unwrap();
        assert!(c.host().removed.contains(&DECO));
    }

    #[test]
    fn test_remove_decoration() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();
        c.add_decoration(DECO, id).unwrap();

        assert_eq!(c.remove_decoration(id), Ok(Some(DECO)));
        assert_eq!(c.remove_decoration(id), Ok(None));
        assert!(c.host().removed.contains(&DECO));
    }

    #[test]
    fn test_shape_of_widget() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();
        c.add_decoration(DECO, id).unwrap();

        assert!(matches!(c.shape_of(S1), Some(Shape::Anchored(s)) if s.widget == S1));
        let decoration = c.shape_of(DECO).unwrap();
        assert!(matches!(decoration, Shape::Decoration(_)));
        assert_eq!(decoration.center(), Point::new(125.0, 15.0));
        assert!(decoration.bounding_rect().is_none());
        assert!(c.shape_of(WidgetId(42)).is_none());
    }

    #[test]
    fn test_remove_decoration_widget_detaches_it() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();
        c.add_decoration(DECO, id).unwrap();

        c.remove_widget(DECO).unwrap();
        assert!(c.host().removed.contains(&DECO));
        assert_eq!(c.connection_count(), 1);
        assert!(c.connection(id).and_then(|k| k.decoration()).is_none());
        assert!(c.shape_of(DECO).is_none());
    }

    #[test]
    fn test_remove_widget_unties_its_connections() {
        let mut c = controller();
        let events = record_events(&mut c);
        let id = c.draw_straight_connection(S1, S2).unwrap();

        c.remove_widget(S1).unwrap();
        assert_eq!(c.connection_count(), 0);
        assert_eq!(c.shapes().len(), 1);
        assert!(c.host().removed.contains(&S1));
        assert!(events.borrow().contains(&DiagramEvent::LinkUntied {
            start: S1,
            end: S2,
            connection: id,
        }));
        assert_eq!(c.remove_widget(S1), Err(DiagramError::UnknownWidget(S1)));
    }

    #[test]
    fn test_paths_follow_moved_widgets() {
        let mut c = controller();
        let id = c.draw_straight_connection(S1, S2).unwrap();

        c.host_mut().rects.insert(S2, Rect::new(200.0, 100.0, 250.0, 130.0));
        c.tick();

        let start = c.shapes().get(c.shapes().id_of(S1).unwrap()).unwrap().clone();
        let end = c.shapes().get(c.shapes().id_of(S2).unwrap()).unwrap().clone();
        let path = c.connection(id).unwrap().path();
        assert_eq!(path.first(), start.anchor_point(path.points()[1]));
        assert_eq!(path.last(), end.anchor_point(path.points()[0]));
        assert_eq!(path.last(), Point::new(200.0, 100.0));
    }

    #[test]
    fn test_connection_errors() {
        let mut c = controller();
        assert_eq!(c.draw_straight_connection(S1, S1), Err(DiagramError::SelfConnection(S1)));
        assert_eq!(
            c.draw_straight_connection(S1, WidgetId(42)),
            Err(DiagramError::UnknownWidget(WidgetId(42)))
        );
        assert_eq!(c.connection_count(), 0);
    }

    #[test]
    fn test_arrow_connection_and_grid_drawn() {
        let mut c = controller();
        c.draw_straight_arrow_connection(S1, S2).unwrap();
        c.show_grid(true);
        c.tick();

        assert_eq!(c.surface().grids, 1);
        assert_eq!(c.surface().arrows, vec![Point::new(200.0, 15.0)]);
        assert_eq!(c.surface().segments.len(), 1);

        c.tick();
        assert_eq!(c.surface().clears, 2);
        assert_eq!(c.surface().segments.len(), 1);
    }

    #[test]
    fn test_frame_rate() {
        let mut c = controller();
        let start = Instant::now();
        assert_eq!(c.measure_frame_rate(start), 0);
        for _ in 0..5 {
            c.tick();
        }
        assert_eq!(c.measure_frame_rate(start + Duration::from_millis(500)), 10);
        assert_eq!(c.fps(), 10);
    }

    #[test]
    fn test_pointer_events_dispatch() {
        let mut c = controller();
        c.handle_pointer_event(PointerEvent::Move {
            position: Point::new(48.0, 15.0),
        });
        c.tick();
        c.handle_pointer_event(PointerEvent::Down {
            position: Point::new(48.0, 15.0),
            button: PointerButton::Primary,
        });
        c.handle_pointer_event(PointerEvent::Up {
            position: Point::new(210.0, 20.0),
            button: PointerButton::Primary,
        });
        assert_eq!(c.connection_count(), 1);
        assert!(c.connections().all(|k| k.has_arrow()));
    }

    #[test]
    fn test_removed_listener_stops_receiving() {
        let mut c = controller();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = c.add_listener(move |_| *sink.borrow_mut() += 1);

        c.draw_straight_connection(S1, S2).unwrap();
        assert!(c.remove_listener(id));
        c.clear_diagram();
        assert_eq!(*count.borrow(), 1);
    }
}
