//! Surface that records draw calls.

use kurbo::{Point, Rect, Vec2};
use tielink_core::host::{SegmentStyle, Surface};

/// One primitive drawn during a tick.
#[derive(Debug, Clone, Copy)]
pub enum DrawCommand {
    Grid {
        spacing: f64,
    },
    Segment {
        p1: Point,
        p2: Point,
        style: SegmentStyle,
    },
    Arrowhead {
        at: Point,
        direction: Vec2,
        size: f64,
        style: SegmentStyle,
    },
    PointMarker {
        at: Point,
    },
    SelectableArea {
        rect: Rect,
    },
}

/// Keeps the commands of the last frame, in draw order.
///
/// `clear_surface` drops the previous frame, so after a tick the recording
/// holds exactly what that tick drew.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of times the surface was cleared.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn segment_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Segment { .. }))
            .count()
    }

    /// Segments drawn with the provisional style.
    pub fn provisional_segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Segment { p1, p2, style } if style.provisional => Some((*p1, *p2)),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn clear_surface(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn draw_segment(&mut self, p1: Point, p2: Point, style: &SegmentStyle) {
        self.commands.push(DrawCommand::Segment {
            p1,
            p2,
            style: *style,
        });
    }

    fn draw_arrowhead(&mut self, at: Point, direction: Vec2, size: f64, style: &SegmentStyle) {
        self.commands.push(DrawCommand::Arrowhead {
            at,
            direction,
            size,
            style: *style,
        });
    }

    fn draw_grid(&mut self, spacing: f64) {
        self.commands.push(DrawCommand::Grid { spacing });
    }

    fn draw_point_marker(&mut self, at: Point) {
        self.commands.push(DrawCommand::PointMarker { at });
    }

    fn draw_selectable_area(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::SelectableArea { rect });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_drops_previous_frame() {
        let mut surface = RecordingSurface::new();
        surface.clear_surface();
        surface.draw_grid(20.0);
        surface.draw_segment(Point::new(0.0, 0.0), Point::new(10.0, 0.0), &SegmentStyle::committed());
        assert_eq!(surface.commands().len(), 2);
        assert_eq!(surface.segment_count(), 1);

        surface.clear_surface();
        assert!(surface.commands().is_empty());
        assert_eq!(surface.frames(), 2);
    }

    #[test]
    fn test_provisional_segments() {
        let mut surface = RecordingSurface::new();
        surface.draw_segment(Point::new(0.0, 0.0), Point::new(1.0, 0.0), &SegmentStyle::committed());
        surface.draw_segment(Point::new(5.0, 5.0), Point::new(9.0, 9.0), &SegmentStyle::provisional());

        let provisional: Vec<_> = surface.provisional_segments().collect();
        assert_eq!(provisional, vec![(Point::new(5.0, 5.0), Point::new(9.0, 9.0))]);
    }
}
