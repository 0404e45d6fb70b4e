//! Replays a scene against the controller.

use crate::error::{AppError, AppResult};
use crate::host::ScriptHost;
use crate::scene::{Scene, ScriptStep};
use kurbo::{Rect, Size};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tielink_core::frame_rate::Instant;
use tielink_core::{DiagramController, DiagramEvent, WidgetId};
use tielink_render::{DrawCommand, RecordingSurface, SvgExporter, SvgOptions};

/// State of the diagram after the script ran.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Host widget rectangles, ordered by widget id.
    pub widgets: Vec<Rect>,
    /// Commands of the last frame.
    pub commands: Vec<DrawCommand>,
    /// Every notification delivered while replaying.
    pub events: Vec<DiagramEvent>,
    pub connections: usize,
    pub ticks: u64,
}

/// Build the scene's diagram, run its script and tick once more.
pub fn run_scene(scene: &Scene) -> AppResult<Outcome> {
    if let Some(missing) = scene
        .connections
        .iter()
        .flat_map(|c| [c.start, c.end])
        .find(|id| !scene.has_widget(*id))
    {
        return Err(AppError::UnknownWidget(missing));
    }

    let mut host = ScriptHost::new();
    for widget in &scene.widgets {
        host.declare(widget.widget(), widget.rect().size());
    }
    for decoration in scene.connections.iter().filter_map(|c| c.decoration) {
        host.declare(WidgetId(decoration.id), Size::new(decoration.width, decoration.height));
    }

    let mut controller =
        DiagramController::with_config(scene.config.clone(), RecordingSurface::new(), host);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    controller.add_listener(move |event| {
        match event {
            DiagramEvent::LinkTied { start, end, .. } => log::info!("Link tied: {} -> {}", start, end),
            DiagramEvent::LinkUntied { start, end, .. } => {
                log::info!("Link untied: {} -> {}", start, end)
            }
            DiagramEvent::DiagramChanged => log::trace!("Diagram changed"),
        }
        sink.borrow_mut().push(event.clone());
    });
    controller.show_grid(scene.show_grid);

    for widget in &scene.widgets {
        controller.add_widget(widget.widget(), widget.x, widget.y);
    }
    for connection in &scene.connections {
        let (start, end) = (WidgetId(connection.start), WidgetId(connection.end));
        let id = if connection.arrow {
            controller.draw_straight_arrow_connection(start, end)?
        } else {
            controller.draw_straight_connection(start, end)?
        };
        if let Some(decoration) = connection.decoration {
            controller.add_decoration(WidgetId(decoration.id), id)?;
        }
    }

    controller.measure_frame_rate(Instant::now());
    controller.tick();
    for step in &scene.script {
        match *step {
            ScriptStep::Pointer(event) => controller.handle_pointer_event(event),
            ScriptStep::Tick { ticks } => {
                for _ in 0..ticks {
                    controller.tick();
                }
            }
            ScriptStep::Menu { context_action } => match controller.host_mut().take_menu() {
                Some(request) => controller.apply_context_action(request, context_action)?,
                None => log::warn!("No context menu open for {:?}", context_action),
            },
        }
    }
    controller.tick();

    let fps = controller.measure_frame_rate(Instant::now());
    let ticks = controller.surface().frames();
    log::debug!("Replayed {} ticks ({} per second)", ticks, fps);

    let recorded = events.borrow().clone();
    Ok(Outcome {
        widgets: controller.host().rects().map(|(_, rect)| rect).collect(),
        commands: controller.surface().commands().to_vec(),
        events: recorded,
        connections: controller.connection_count(),
        ticks,
    })
}

/// Write the final frame of a replayed scene as SVG.
pub fn export_svg(scene: &Scene, outcome: &Outcome, output: &Path) -> AppResult<()> {
    let exporter = SvgExporter::new(SvgOptions::new(scene.size()));
    exporter.save(&outcome.widgets, &outcome.commands, output)?;
    Ok(())
}

/// Load a scene file, replay it and export the result.
pub fn render_scene_file(scene_path: &Path, output: &Path) -> AppResult<Outcome> {
    let scene = Scene::load(scene_path)?;
    let outcome = run_scene(&scene)?;
    export_svg(&scene, &outcome, output)?;
    Ok(outcome)
}
