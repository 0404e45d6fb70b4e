//! TieLink Application
//!
//! Command line host for the diagram controller: loads a scene, replays a
//! pointer script tick by tick and exports the final frame.

mod error;
mod host;
mod runner;
mod scene;

pub use error::{AppError, AppResult};
pub use host::ScriptHost;
pub use runner::{Outcome, export_svg, render_scene_file, run_scene};
pub use scene::{ConnectionSpec, DecorationSpec, Scene, ScriptStep, WidgetSpec};
