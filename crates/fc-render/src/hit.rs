//! Hit testing: screen point → port, node, or empty canvas.
//!
//! Walks nodes top to bottom (reverse paint order). For each node the two
//! port discs are tested before the card body, since ports overhang the
//! card edges.

use crate::project::{input_port_world, output_port_world};
use fc_core::{CanvasConfig, NodeGraph, NodeId, Viewport};
use kurbo::{Point, Rect};

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Empty canvas.
    Canvas,
    /// A node's card body.
    NodeBody(NodeId),
    /// A node's own interactive control (prompt box, buttons).
    /// Never produced by [`hit_test`]; DOM hosts report it directly.
    NodeControl(NodeId),
    /// A node's single input port (left edge).
    InputPort(NodeId),
    /// A node's output port (right edge).
    OutputPort(NodeId),
}

impl HitTarget {
    pub fn node(self) -> Option<NodeId> {
        match self {
            HitTarget::Canvas => None,
            HitTarget::NodeBody(id)
            | HitTarget::NodeControl(id)
            | HitTarget::InputPort(id)
            | HitTarget::OutputPort(id) => Some(id),
        }
    }
}

/// Find the topmost target under the screen point `screen`.
pub fn hit_test(
    graph: &NodeGraph,
    viewport: &Viewport,
    config: &CanvasConfig,
    screen: Point,
) -> HitTarget {
    let p = viewport.screen_to_world(screen);
    let r2 = config.port_radius * config.port_radius;

    for node in graph.nodes().rev() {
        if (output_port_world(node, config) - p).hypot2() <= r2 {
            return HitTarget::OutputPort(node.id);
        }
        if (input_port_world(node, config) - p).hypot2() <= r2 {
            return HitTarget::InputPort(node.id);
        }
        if Rect::from_origin_size(node.position, config.node_size()).contains(p) {
            return HitTarget::NodeBody(node.id);
        }
    }
    HitTarget::Canvas
}
