//! Errors reported by the controller API.

use crate::connection::ConnectionId;
use crate::shapes::{ShapeId, WidgetId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DiagramError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),
    #[error("Unknown widget: {0}")]
    UnknownWidget(WidgetId),
    #[error("Unknown shape: {0}")]
    UnknownShape(ShapeId),
    #[error("Cannot connect {0} to itself")]
    SelfConnection(WidgetId),
}

/// Result type for controller operations.
pub type DiagramResult<T> = Result<T, DiagramError>;
