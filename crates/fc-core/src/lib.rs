pub mod config;
pub mod graph;
pub mod id;
pub mod model;
pub mod viewport;

pub use config::CanvasConfig;
pub use graph::NodeGraph;
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use viewport::Viewport;

// Re-export geometry types so downstream crates share one kurbo version
pub use kurbo::{Point, Rect, Size, Vec2};
