pub mod hit;
pub mod paint;
pub mod project;

pub use hit::{HitTarget, hit_test};
pub use paint::{Palette, paint_frame};
pub use project::{
    EdgeGeometry, Frame, GestureOverlay, NodeCard, PortAnchors, PreviewGeometry, connection_curve,
    curve_svg_path, project_frame,
};
