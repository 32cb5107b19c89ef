//! Integration tests: graph store invariants under viewport changes.
//!
//! Exercises `fc-core` end to end: config → viewport → node placement →
//! edge policy → cascade delete.

use fc_core::{CanvasConfig, MediaRef, NodeGraph, NodeKind, ParamsPatch, Point, Vec2, Viewport};

// ─── Placement ──────────────────────────────────────────────────────────

#[test]
fn new_nodes_land_at_spawn_anchor_for_any_viewport() {
    let config = CanvasConfig::default();
    let mut viewport = Viewport::new(&config);
    let mut graph = NodeGraph::new();

    for (pan, zoom) in [
        (Vec2::ZERO, 1.0),
        (Vec2::new(-2000.0, 800.0), 0.15),
        (Vec2::new(333.0, -90.0), 2.5),
    ] {
        viewport.set_pan(pan);
        viewport.set_zoom(zoom);
        let id = graph.add_node(NodeKind::ImageGen, &viewport, &config);
        let on_screen = viewport.world_to_screen(graph.node(id).unwrap().position);
        assert!(
            (on_screen.x - 200.0).abs() < 1e-9 && (on_screen.y - 200.0).abs() < 1e-9,
            "node placed at {on_screen:?} for pan={pan:?} zoom={zoom}"
        );
    }
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn custom_spawn_anchor_from_config() {
    let config = CanvasConfig::from_json(r#"{"spawn_anchor": [40.0, 60.0]}"#).unwrap();
    let viewport = Viewport::new(&config);
    let mut graph = NodeGraph::new();
    let id = graph.add_node(NodeKind::Camera, &viewport, &config);
    assert_eq!(graph.node(id).unwrap().position, Point::new(40.0, 60.0));
}

// ─── Edge policy ────────────────────────────────────────────────────────

#[test]
fn input_port_holds_a_single_edge_through_many_rewires() {
    let mut graph = NodeGraph::new();
    let target = graph.add_node_at(NodeKind::VideoGen, Point::new(800.0, 0.0));
    let sources: Vec<_> = (0..5)
        .map(|i| graph.add_node_at(NodeKind::ImageGen, Point::new(0.0, i as f64 * 500.0)))
        .collect();

    for &src in &sources {
        graph.add_edge(src, target).unwrap();
        assert_eq!(graph.edges().filter(|e| e.to == target).count(), 1);
        assert_eq!(graph.incoming_edge(target).unwrap().from, src);
    }
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn starter_graph_can_be_wired_and_pruned() {
    let mut graph = NodeGraph::with_starter_nodes();
    let image = fc_core::NodeId::intern("node-1");
    let video = fc_core::NodeId::intern("node-2");

    graph.add_edge(image, video).unwrap();
    graph.set_node_output(image, Some(MediaRef::new("img://1")));
    graph.update_node_params(video, ParamsPatch::prompt("orbit left"));

    assert_eq!(graph.upstream_output(video).map(MediaRef::as_str), Some("img://1"));
    assert_eq!(graph.node(video).unwrap().data.params.prompt, "orbit left");

    graph.remove_node(video);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.incoming_edge(video).is_none());
}
