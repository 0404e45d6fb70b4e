//! TieLink Core Library
//!
//! Platform-agnostic geometry, path and interaction logic for connecting
//! widgets on a diagram surface. Rendering and widget placement are left to
//! the [`host::Surface`] and [`host::WidgetHost`] collaborators.

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod events;
pub mod frame_rate;
pub mod geometry;
pub mod host;
pub mod input;
pub mod path;
pub mod shapes;

pub use config::ControllerConfig;
pub use connection::{Connection, ConnectionId, ConnectionStyle, MovablePoint, WaypointCandidate};
pub use controller::{DiagramController, InteractionState, Phase};
pub use error::{DiagramError, DiagramResult};
pub use events::{DiagramEvent, EventBus, ListenerId};
pub use frame_rate::FrameCounter;
pub use geometry::Segment;
pub use host::{ContextAction, ContextMenuRequest, CursorStyle, SegmentStyle, Surface, WidgetHost};
pub use input::{PointerButton, PointerEvent};
pub use path::Path;
pub use shapes::{AnchoredShape, DecorationShape, MouseShape, Shape, ShapeId, ShapeRef, ShapeRegistry, ShapeTrait, WidgetId};
