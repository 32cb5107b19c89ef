//! Screen-space projection of the graph, recomputed every frame.
//!
//! Ports sit on the vertical center of a card: the output on the right
//! edge, the single input on the left. Every anchor goes through
//! `Viewport::world_to_screen`, the same transform hit testing uses.
//!
//! Edges are cubic beziers whose control points are pushed horizontally
//! away from each anchor by `tension * |x2 - x1|`, which flattens into a
//! straight segment as the horizontal gap closes.

use fc_core::{CanvasConfig, CanvasNode, EdgeId, NodeGraph, NodeId, NodeKind, Viewport};
use kurbo::{BezPath, CubicBez, Point, Rect, Vec2};
use serde::Serialize;

/// Edge stroke width in world units (scaled with zoom).
pub const EDGE_WIDTH: f64 = 3.0;
/// Radius of the dots drawn on edge endpoints, in world units.
pub const PORT_DOT_RADIUS: f64 = 4.0;
/// Preview stroke width in screen pixels (not scaled).
pub const PREVIEW_WIDTH: f64 = 2.0;
/// Preview dash pattern in screen pixels.
pub const PREVIEW_DASH: [f64; 2] = [6.0, 6.0];

// ─── Anchors and curves ─────────────────────────────────────────────────

/// Screen positions of one node's two ports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortAnchors {
    pub input: Point,
    pub output: Point,
}

/// World position of a node's output port.
pub fn output_port_world(node: &CanvasNode, config: &CanvasConfig) -> Point {
    Point::new(
        node.position.x + config.node_width,
        node.position.y + config.node_height / 2.0,
    )
}

/// World position of a node's input port.
pub fn input_port_world(node: &CanvasNode, config: &CanvasConfig) -> Point {
    Point::new(node.position.x, node.position.y + config.node_height / 2.0)
}

pub fn port_anchors(node: &CanvasNode, viewport: &Viewport, config: &CanvasConfig) -> PortAnchors {
    PortAnchors {
        input: viewport.world_to_screen(input_port_world(node, config)),
        output: viewport.world_to_screen(output_port_world(node, config)),
    }
}

/// S-curve from an output anchor to an input anchor (or the live pointer).
pub fn connection_curve(start: Point, end: Point, tension: f64) -> CubicBez {
    let dx = (end.x - start.x).abs() * tension;
    CubicBez::new(
        start,
        Point::new(start.x + dx, start.y),
        Point::new(end.x - dx, end.y),
        end,
    )
}

/// SVG path data (`M x y C ...`) for DOM hosts drawing into an `<svg>`.
pub fn curve_svg_path(curve: &CubicBez) -> String {
    let mut path = BezPath::new();
    path.move_to(curve.p0);
    path.curve_to(curve.p1, curve.p2, curve.p3);
    path.to_svg()
}

// ─── Frame ──────────────────────────────────────────────────────────────

/// Transient gesture state the projector needs to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureOverlay {
    /// Node being dragged; drawn on top and highlighted.
    pub dragging: Option<NodeId>,
    /// Connection in progress: source node and live pointer (screen).
    pub connecting: Option<(NodeId, Point)>,
}

/// A node card in screen space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCard {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub rect: Rect,
    pub ports: PortAnchors,
    pub loading: bool,
    pub has_output: bool,
    pub failed: bool,
    pub dragging: bool,
    /// A connection from another node is being drawn; this input port accepts it.
    pub connect_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeGeometry {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub curve: CubicBez,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewGeometry {
    pub source: NodeId,
    pub curve: CubicBez,
}

/// Background dot grid: pitch in screen pixels and phase offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    pub spacing: f64,
    pub offset: Vec2,
}

/// Zoom-dependent stroke metrics for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokeMetrics {
    pub edge_width: f64,
    pub port_dot_radius: f64,
    /// Port disc radius; the same radius `hit_test` uses.
    pub port_radius: f64,
    pub preview_width: f64,
    pub preview_dash: [f64; 2],
}

/// Everything visible on the canvas for one display refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub zoom: f64,
    pub grid: GridSpec,
    pub strokes: StrokeMetrics,
    /// Bottom to top; a dragged card is moved last.
    pub nodes: Vec<NodeCard>,
    pub edges: Vec<EdgeGeometry>,
    pub preview: Option<PreviewGeometry>,
}

/// Project the whole graph into screen space.
///
/// Edges whose endpoints no longer resolve are skipped, as is a preview
/// whose source node has gone away.
pub fn project_frame(
    graph: &NodeGraph,
    viewport: &Viewport,
    config: &CanvasConfig,
    overlay: &GestureOverlay,
) -> Frame {
    let connecting_from = overlay.connecting.map(|(source, _)| source);

    let mut nodes: Vec<NodeCard> = graph
        .nodes()
        .map(|node| project_node(node, viewport, config, overlay, connecting_from))
        .collect();
    if let Some(dragged) = overlay.dragging
        && let Some(pos) = nodes.iter().position(|c| c.id == dragged)
    {
        let card = nodes.remove(pos);
        nodes.push(card);
    }

    let edges: Vec<EdgeGeometry> = graph
        .edges()
        .filter_map(|edge| {
            let (from, to) = (graph.node(edge.from)?, graph.node(edge.to)?);
            let start = viewport.world_to_screen(output_port_world(from, config));
            let end = viewport.world_to_screen(input_port_world(to, config));
            Some(EdgeGeometry {
                id: edge.id,
                from: edge.from,
                to: edge.to,
                curve: connection_curve(start, end, config.curve_tension),
            })
        })
        .collect();

    let preview = overlay.connecting.and_then(|(source, pointer)| {
        let node = graph.node(source)?;
        let start = viewport.world_to_screen(output_port_world(node, config));
        Some(PreviewGeometry {
            source,
            curve: connection_curve(start, pointer, config.curve_tension),
        })
    });

    log::trace!(
        "project frame: {} nodes, {} edges, preview={}",
        nodes.len(),
        edges.len(),
        preview.is_some()
    );

    Frame {
        zoom: viewport.zoom(),
        grid: GridSpec {
            spacing: viewport.scale(config.grid_spacing),
            offset: viewport.pan(),
        },
        strokes: StrokeMetrics {
            edge_width: viewport.scale(EDGE_WIDTH),
            port_dot_radius: viewport.scale(PORT_DOT_RADIUS),
            port_radius: viewport.scale(config.port_radius),
            preview_width: PREVIEW_WIDTH,
            preview_dash: PREVIEW_DASH,
        },
        nodes,
        edges,
        preview,
    }
}

fn project_node(
    node: &CanvasNode,
    viewport: &Viewport,
    config: &CanvasConfig,
    overlay: &GestureOverlay,
    connecting_from: Option<NodeId>,
) -> NodeCard {
    let world = Rect::from_origin_size(node.position, config.node_size());
    NodeCard {
        id: node.id,
        kind: node.kind,
        label: node.data.label.clone(),
        rect: viewport.world_rect_to_screen(world),
        ports: port_anchors(node, viewport, config),
        loading: node.data.loading,
        has_output: node.data.output.is_some(),
        failed: node.data.error.is_some(),
        dragging: overlay.dragging == Some(node.id),
        connect_target: connecting_from.is_some_and(|src| src != node.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::NodeKind;
    use pretty_assertions::assert_eq;

    fn setup() -> (NodeGraph, NodeId, NodeId) {
        let mut g = NodeGraph::new();
        let a = g.add_node_at(NodeKind::ImageGen, Point::new(0.0, 0.0));
        let b = g.add_node_at(NodeKind::VideoGen, Point::new(600.0, 100.0));
        (g, a, b)
    }

    #[test]
    fn anchors_sit_on_vertical_center() {
        let (g, a, _) = setup();
        let config = CanvasConfig::default();
        let mut vp = Viewport::new(&config);
        vp.set_pan(Vec2::new(10.0, 20.0));
        vp.set_zoom(0.5);

        let anchors = port_anchors(g.node(a).unwrap(), &vp, &config);
        assert_eq!(anchors.output, Point::new(320.0 * 0.5 + 10.0, 220.0 * 0.5 + 20.0));
        assert_eq!(anchors.input, Point::new(10.0, 220.0 * 0.5 + 20.0));
    }

    #[test]
    fn control_points_offset_by_tension() {
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(200.0, 50.0), 0.45);
        assert_eq!(c.p1, Point::new(90.0, 0.0));
        assert_eq!(c.p2, Point::new(110.0, 50.0));
    }

    #[test]
    fn zero_gap_degenerates_to_straight_line() {
        let c = connection_curve(Point::new(5.0, 0.0), Point::new(5.0, 80.0), 0.45);
        assert_eq!(c.p1, c.p0);
        assert_eq!(c.p2, c.p3);
    }

    #[test]
    fn backwards_edge_uses_absolute_gap() {
        let c = connection_curve(Point::new(300.0, 0.0), Point::new(100.0, 0.0), 0.5);
        assert_eq!(c.p1, Point::new(400.0, 0.0));
        assert_eq!(c.p2, Point::new(0.0, 0.0));
    }

    #[test]
    fn frame_projects_edges_between_ports() {
        let (mut g, a, b) = setup();
        let id = g.add_edge(a, b).unwrap();
        let config = CanvasConfig::default();
        let vp = Viewport::new(&config);

        let frame = project_frame(&g, &vp, &config, &GestureOverlay::default());
        assert_eq!(frame.edges.len(), 1);
        let edge = frame.edges[0];
        assert_eq!(edge.id, id);
        assert_eq!(edge.curve.p0, Point::new(320.0, 220.0));
        assert_eq!(edge.curve.p3, Point::new(600.0, 320.0));
        assert!(frame.preview.is_none());
    }

    #[test]
    fn preview_follows_live_pointer() {
        let (g, a, b) = setup();
        let config = CanvasConfig::default();
        let vp = Viewport::new(&config);
        let overlay = GestureOverlay {
            dragging: None,
            connecting: Some((a, Point::new(450.0, 500.0))),
        };

        let frame = project_frame(&g, &vp, &config, &overlay);
        let preview = frame.preview.unwrap();
        assert_eq!(preview.source, a);
        assert_eq!(preview.curve.p0, Point::new(320.0, 220.0));
        assert_eq!(preview.curve.p3, Point::new(450.0, 500.0));

        let target = frame.nodes.iter().find(|c| c.id == b).unwrap();
        let source = frame.nodes.iter().find(|c| c.id == a).unwrap();
        assert!(target.connect_target);
        assert!(!source.connect_target);
    }

    #[test]
    fn preview_skipped_when_source_deleted() {
        let (mut g, a, _) = setup();
        g.remove_node(a);
        let config = CanvasConfig::default();
        let overlay = GestureOverlay {
            dragging: None,
            connecting: Some((a, Point::ZERO)),
        };
        let frame = project_frame(&g, &Viewport::new(&config), &config, &overlay);
        assert!(frame.preview.is_none());
    }

    #[test]
    fn dragged_card_is_painted_last() {
        let (g, a, b) = setup();
        let config = CanvasConfig::default();
        let overlay = GestureOverlay {
            dragging: Some(a),
            connecting: None,
        };
        let frame = project_frame(&g, &Viewport::new(&config), &config, &overlay);
        let order: Vec<NodeId> = frame.nodes.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![b, a]);
        assert!(frame.nodes[1].dragging);
    }

    #[test]
    fn strokes_and_grid_scale_with_zoom() {
        let (g, _, _) = setup();
        let config = CanvasConfig::default();
        let mut vp = Viewport::new(&config);
        vp.set_zoom(2.0);
        vp.set_pan(Vec2::new(7.0, 9.0));
        let frame = project_frame(&g, &vp, &config, &GestureOverlay::default());
        assert_eq!(frame.strokes.edge_width, 6.0);
        assert_eq!(frame.strokes.port_dot_radius, 8.0);
        assert_eq!(frame.strokes.preview_width, 2.0);
        assert_eq!(frame.grid.spacing, 96.0);
        assert_eq!(frame.grid.offset, Vec2::new(7.0, 9.0));
        assert_eq!(frame.nodes[0].rect, Rect::new(7.0, 9.0, 647.0, 889.0));
    }

    #[test]
    fn svg_path_starts_with_move_and_cubic() {
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0.45);
        let svg = curve_svg_path(&c);
        assert!(svg.starts_with('M'), "{svg}");
        assert!(svg.contains('C'), "{svg}");
    }
}
