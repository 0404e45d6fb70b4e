//! Application errors.

use thiserror::Error;
use tielink_core::DiagramError;
use tielink_render::RendererError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scene file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scene references unknown widget {0}")]
    UnknownWidget(u64),
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

pub type AppResult<T> = Result<T, AppError>;
