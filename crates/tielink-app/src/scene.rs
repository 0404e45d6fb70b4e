//! Scene files: widgets, initial connections and a pointer script.

use crate::error::AppResult;
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tielink_core::{ContextAction, ControllerConfig, PointerEvent, WidgetId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Exported document size.
    pub width: f64,
    pub height: f64,
    pub show_grid: bool,
    pub config: ControllerConfig,
    pub widgets: Vec<WidgetSpec>,
    pub connections: Vec<ConnectionSpec>,
    pub script: Vec<ScriptStep>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            show_grid: false,
            config: ControllerConfig::default(),
            widgets: Vec::new(),
            connections: Vec::new(),
            script: Vec::new(),
        }
    }
}

impl Scene {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn has_widget(&self, id: u64) -> bool {
        self.widgets.iter().any(|w| w.id == id)
    }
}

/// A widget placed on the surface before the script runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WidgetSpec {
    pub fn widget(&self) -> WidgetId {
        WidgetId(self.id)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// A connection drawn programmatically before the script runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub start: u64,
    pub end: u64,
    #[serde(default)]
    pub arrow: bool,
    #[serde(default)]
    pub decoration: Option<DecorationSpec>,
}

/// Widget shown in the middle of a connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecorationSpec {
    pub id: u64,
    pub width: f64,
    pub height: f64,
}

/// One script step.
///
/// ```json
/// { "type": "move", "position": { "x": 48.0, "y": 15.0 } }
/// { "ticks": 3 }
/// { "context_action": "Delete" }
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// Run the controller update this many times.
    Tick { ticks: u32 },
    /// Answer the last contextual menu the controller opened.
    Menu { context_action: ContextAction },
    Pointer(PointerEvent),
}
