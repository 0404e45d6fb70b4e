//! TieLink Render Library
//!
//! Surface implementations for TieLink. [`RecordingSurface`] keeps the draw
//! commands of the current frame; [`SvgExporter`] turns them into an SVG
//! document.

mod recording;
mod svg;

pub use recording::{DrawCommand, RecordingSurface};
pub use svg::{RenderResult, RendererError, SvgExporter, SvgOptions};
