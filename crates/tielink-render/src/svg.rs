//! SVG export of a recorded frame.

use crate::recording::DrawCommand;
use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tielink_core::host::SegmentStyle;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Document-level settings of an SVG export.
#[derive(Debug, Clone, Copy)]
pub struct SvgOptions {
    /// Document size in pixels; also bounds the grid.
    pub size: Size,
    pub background_color: Color,
    pub grid_color: Color,
    /// Outline of the host widgets.
    pub widget_color: Color,
    /// Waypoint insertion marker.
    pub marker_color: Color,
    /// Border zone of a hovered shape.
    pub area_color: Color,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            size: Size::new(800.0, 600.0),
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_color: Color::from_rgba8(220, 220, 220, 255),
            widget_color: Color::from_rgba8(30, 30, 30, 255),
            marker_color: Color::from_rgba8(239, 68, 68, 255),
            area_color: Color::from_rgba8(59, 130, 246, 255),
        }
    }
}

impl SvgOptions {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

/// Turns recorded draw commands into a standalone SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgExporter {
    options: SvgOptions,
}

impl SvgExporter {
    pub fn new(options: SvgOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SvgOptions {
        &self.options
    }

    pub fn render(&self, commands: &[DrawCommand]) -> RenderResult<String> {
        self.render_frame(&[], commands)
    }

    /// Render widget boxes under the recorded commands.
    pub fn render_frame(&self, widgets: &[Rect], commands: &[DrawCommand]) -> RenderResult<String> {
        let Size { width, height } = self.options.size;
        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        )?;
        writeln!(
            out,
            r#"  <rect x="0" y="0" width="{width}" height="{height}" {}/>"#,
            fill(self.options.background_color)
        )?;
        for rect in widgets {
            writeln!(
                out,
                r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="white" {} stroke-width="1"/>"#,
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height(),
                stroke(self.options.widget_color)
            )?;
        }
        for command in commands {
            self.render_command(&mut out, command)?;
        }
        writeln!(out, "</svg>")?;
        Ok(out)
    }

    pub fn write_to(
        &self,
        widgets: &[Rect],
        commands: &[DrawCommand],
        mut writer: impl std::io::Write,
    ) -> RenderResult<()> {
        let document = self.render_frame(widgets, commands)?;
        writer.write_all(document.as_bytes())?;
        Ok(())
    }

    pub fn save(&self, widgets: &[Rect], commands: &[DrawCommand], path: &Path) -> RenderResult<()> {
        let document = self.render_frame(widgets, commands)?;
        std::fs::write(path, document)?;
        log::info!("Wrote {} draw commands to {}", commands.len(), path.display());
        Ok(())
    }

    fn render_command(&self, out: &mut String, command: &DrawCommand) -> std::fmt::Result {
        match *command {
            DrawCommand::Grid { spacing } => self.render_grid(out, spacing),
            DrawCommand::Segment { p1, p2, style } => {
                let dash = if style.provisional {
                    r#" stroke-dasharray="6 4""#
                } else {
                    ""
                };
                writeln!(
                    out,
                    r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" {} stroke-width="{}" stroke-linecap="round"{dash}/>"#,
                    p1.x,
                    p1.y,
                    p2.x,
                    p2.y,
                    stroke(style.color),
                    style.width
                )
            }
            DrawCommand::Arrowhead {
                at,
                direction,
                size,
                style,
            } => render_arrowhead(out, at, direction, size, &style),
            DrawCommand::PointMarker { at } => writeln!(
                out,
                r#"  <circle cx="{}" cy="{}" r="4" {}/>"#,
                at.x,
                at.y,
                fill(self.options.marker_color)
            ),
            DrawCommand::SelectableArea { rect } => self.render_area(out, rect),
        }
    }

    fn render_grid(&self, out: &mut String, spacing: f64) -> std::fmt::Result {
        if spacing <= 0.0 {
            return Ok(());
        }
        let Size { width, height } = self.options.size;
        let color = stroke(self.options.grid_color);
        let mut x = spacing;
        while x < width {
            writeln!(out, r#"  <line x1="{x}" y1="0" x2="{x}" y2="{height}" {color} stroke-width="1"/>"#)?;
            x += spacing;
        }
        let mut y = spacing;
        while y < height {
            writeln!(out, r#"  <line x1="0" y1="{y}" x2="{width}" y2="{y}" {color} stroke-width="1"/>"#)?;
            y += spacing;
        }
        Ok(())
    }

    fn render_area(&self, out: &mut String, rect: Rect) -> std::fmt::Result {
        writeln!(
            out,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="none" {} stroke-width="1" stroke-dasharray="4 2"/>"#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            stroke(self.options.area_color)
        )
    }
}

/// Filled triangle with its tip at `at`.
fn render_arrowhead(
    out: &mut String,
    at: Point,
    direction: Vec2,
    size: f64,
    style: &SegmentStyle,
) -> std::fmt::Result {
    let base = at - direction * size;
    let half = Vec2::new(-direction.y, direction.x) * (size * 0.5);
    let left = base + half;
    let right = base - half;
    writeln!(
        out,
        r#"  <polygon points="{},{} {},{} {},{}" {}/>"#,
        at.x,
        at.y,
        left.x,
        left.y,
        right.x,
        right.y,
        fill(style.color)
    )
}

fn stroke(color: Color) -> String {
    let (rgb, opacity) = color_parts(color);
    format!(r#"stroke="{rgb}" stroke-opacity="{opacity}""#)
}

fn fill(color: Color) -> String {
    let (rgb, opacity) = color_parts(color);
    format!(r#"fill="{rgb}" fill-opacity="{opacity}""#)
}

fn color_parts(color: Color) -> (String, f64) {
    let c = color.to_rgba8();
    (format!("rgb({},{},{})", c.r, c.g, c.b), f64::from(c.a) / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingSurface;
    use tielink_core::host::Surface;

    fn frame() -> RecordingSurface {
        let mut surface = RecordingSurface::new();
        surface.clear_surface();
        surface.draw_segment(Point::new(0.0, 0.0), Point::new(10.0, 0.0), &SegmentStyle::committed());
        surface.draw_arrowhead(Point::new(10.0, 0.0), Vec2::new(1.0, 0.0), 10.0, &SegmentStyle::committed());
        surface
    }

    #[test]
    fn test_render_segment_and_arrowhead() {
        let svg = SvgExporter::default().render(frame().commands()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"<line x1="0" y1="0" x2="10" y2="0" stroke="rgb(60,60,60)""#));
        assert!(svg.contains(r#"points="10,0 0,5 0,-5""#));
        assert!(!svg.contains("stroke-dasharray=\"6 4\""));
    }

    #[test]
    fn test_provisional_segment_is_dashed() {
        let mut surface = RecordingSurface::new();
        surface.draw_segment(Point::new(1.0, 2.0), Point::new(3.0, 4.0), &SegmentStyle::provisional());
        let svg = SvgExporter::default().render(surface.commands()).unwrap();
        assert!(svg.contains(r#"stroke-dasharray="6 4""#));
        assert!(svg.contains("rgb(59,130,246)"));
    }

    #[test]
    fn test_grid_lines() {
        let mut surface = RecordingSurface::new();
        surface.draw_grid(50.0);
        let exporter = SvgExporter::new(SvgOptions::new(Size::new(100.0, 100.0)));
        let svg = exporter.render(surface.commands()).unwrap();
        // One vertical and one horizontal line at 50, plus the background.
        assert_eq!(svg.matches("<line").count(), 2);
        assert!(svg.contains(r#"<line x1="50" y1="0" x2="50" y2="100""#));
    }

    #[test]
    fn test_hover_feedback() {
        let mut surface = RecordingSurface::new();
        surface.draw_point_marker(Point::new(5.0, 6.0));
        surface.draw_selectable_area(Rect::new(0.0, 0.0, 50.0, 30.0));
        let svg = SvgExporter::default().render(surface.commands()).unwrap();
        assert!(svg.contains(r#"<circle cx="5" cy="6" r="4""#));
        assert!(svg.contains(r#"<rect x="0" y="0" width="50" height="30" fill="none""#));
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        SvgExporter::default()
            .write_to(&[Rect::new(0.0, 0.0, 50.0, 30.0)], frame().commands(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("<polygon"));
        assert!(text.contains(r#"<rect x="0" y="0" width="50" height="30" fill="white""#));
    }
}
