//! Tunable constants of the controller.

use serde::{Deserialize, Serialize};

/// Pointer within this many pixels of a path counts as "on" it.
pub const MIN_DISTANCE_TO_SEGMENT: f64 = 10.0;

/// Width of the border zone around a widget that starts a new connection.
pub const SELECTABLE_MARGIN: f64 = 10.0;

/// Interaction update rate, in milliseconds.
pub const REFRESH_RATE_MS: u64 = 25;

/// Frame-rate measurement window, in milliseconds.
pub const FRAME_RATE_INTERVAL_MS: u64 = 1000;

/// Controller settings. Missing fields fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub min_distance_to_segment: f64,
    pub selectable_margin: f64,
    /// How often the host should call `tick`.
    pub refresh_rate_ms: u64,
    /// How often the host should call `measure_frame_rate`.
    pub frame_rate_interval_ms: u64,
    pub arrow_head_size: f64,
    pub grid_spacing: f64,
    /// Flattening tolerance for curved connections, in pixels.
    pub curve_tolerance: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_distance_to_segment: MIN_DISTANCE_TO_SEGMENT,
            selectable_margin: SELECTABLE_MARGIN,
            refresh_rate_ms: REFRESH_RATE_MS,
            frame_rate_interval_ms: FRAME_RATE_INTERVAL_MS,
            arrow_head_size: 10.0,
            grid_spacing: 20.0,
            curve_tolerance: 0.25,
        }
    }
}
