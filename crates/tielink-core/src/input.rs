//! Pointer events delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    /// Context button (usually the right one).
    Secondary,
}

/// Pointer event type, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Move {
        position: Point,
    },
    Down {
        position: Point,
        button: PointerButton,
    },
    Up {
        position: Point,
        button: PointerButton,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Move { position }
            | PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. } => *position,
        }
    }
}
