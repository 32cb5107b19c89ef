//! In-memory graph store.
//!
//! Nodes are petgraph vertices; connections are petgraph edges carrying an
//! [`Edge`] weight. Removing a vertex drops its incident edges, so a node
//! delete can never leave a dangling connection behind.
//!
//! Invalid mutations (self-loops, duplicate pairs, unknown ids) are silent
//! no-ops reported through the `bool` / `Option` return values.

use crate::config::CanvasConfig;
use crate::id::{EdgeId, IdSequence, NodeId};
use crate::model::{CanvasNode, Edge, MediaRef, NodeKind, ParamsPatch};
use crate::viewport::Viewport;
use kurbo::Point;
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// The node/edge collection of one open canvas.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    /// The underlying directed graph (output port → input port).
    pub graph: StableDiGraph<CanvasNode, Edge>,
    /// Id → vertex lookup.
    index: HashMap<NodeId, NodeIndex>,
    /// Paint order, bottom to top. New nodes are appended.
    order: Vec<NodeId>,
    /// Edge id → petgraph edge.
    edge_slots: HashMap<EdgeId, EdgeIndex>,
    /// Edge paint order. A replacement edge goes last, never into the
    /// freed petgraph slot's position.
    edge_order: Vec<EdgeId>,
    ids: IdSequence,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph seeded with the demo pair shown when a project opens:
    /// an image generator wired for a video generator to its right.
    pub fn with_starter_nodes() -> Self {
        let mut graph = Self::new();
        graph.insert_node(
            CanvasNode::new(
                NodeId::intern("node-1"),
                NodeKind::ImageGen,
                Point::new(100.0, 150.0),
            )
            .with_prompt("A rain-soaked cyberpunk street at night"),
        );
        graph.insert_node(
            CanvasNode::new(
                NodeId::intern("node-2"),
                NodeKind::VideoGen,
                Point::new(600.0, 150.0),
            )
            .with_prompt("Slow push-in camera move"),
        );
        graph
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// World position for a new node: the configured screen anchor mapped
    /// through the current viewport, so it lands in the visible region.
    pub fn spawn_position(viewport: &Viewport, config: &CanvasConfig) -> Point {
        viewport.screen_to_world(config.spawn_anchor())
    }

    /// Create a node of `kind` at the spawn position and return its id.
    pub fn add_node(&mut self, kind: NodeKind, viewport: &Viewport, config: &CanvasConfig) -> NodeId {
        self.add_node_at(kind, Self::spawn_position(viewport, config))
    }

    /// Create a node of `kind` at an explicit world position.
    pub fn add_node_at(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let id = self.fresh_node_id();
        self.insert_node(CanvasNode::new(id, kind, position));
        id
    }

    /// Insert a fully-built node. Returns `false` if the id is already taken.
    pub fn insert_node(&mut self, node: CanvasNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id;
        log::debug!("add node {id} ({}) at {:?}", node.kind, node.position);
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        self.order.push(id);
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<CanvasNode> {
        let idx = self.index.remove(&id)?;
        self.order.retain(|n| *n != id);
        let touching: Vec<EdgeId> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .chain(self.graph.edges_directed(idx, Direction::Outgoing))
            .map(|e| e.weight().id)
            .collect();
        log::debug!("remove node {id} (cascading {} edges)", touching.len());
        for edge in &touching {
            self.forget_edge(*edge);
        }
        self.graph.remove_node(idx)
    }

    pub fn update_node_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn update_node_params(&mut self, id: NodeId, patch: ParamsPatch) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                patch.apply_to(&mut node.data.params);
                true
            }
            None => false,
        }
    }

    pub fn set_node_loading(&mut self, id: NodeId, loading: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data.loading = loading;
                true
            }
            None => false,
        }
    }

    pub fn set_node_output(&mut self, id: NodeId, output: Option<MediaRef>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data.output = output;
                true
            }
            None => false,
        }
    }

    pub fn set_node_error(&mut self, id: NodeId, error: Option<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data.error = error;
                true
            }
            None => false,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&CanvasNode> {
        let idx = *self.index.get(&id)?;
        self.graph.node_weight(idx)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut CanvasNode> {
        let idx = *self.index.get(&id)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Nodes in paint order, bottom to top.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &CanvasNode> + '_ {
        self.order.iter().filter_map(|id| self.node(*id))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Connect `from`'s output to `to`'s input.
    ///
    /// - self-loops, unknown endpoints and an identical existing pair are
    ///   rejected with `None`;
    /// - an input port accepts a single edge, so any other edge into `to`
    ///   is removed before the new one is appended.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if from == to {
            log::debug!("reject self-loop on {from}");
            return None;
        }
        let (&from_idx, &to_idx) = (self.index.get(&from)?, self.index.get(&to)?);

        let incoming: Vec<(EdgeIndex, Edge)> = self
            .graph
            .edges_directed(to_idx, Direction::Incoming)
            .map(|e| (e.id(), *e.weight()))
            .collect();
        if incoming.iter().any(|(_, e)| e.from == from) {
            return None;
        }
        for (edge_idx, old) in incoming {
            log::debug!("replace edge {} -> {to}", old.from);
            self.forget_edge(old.id);
            self.graph.remove_edge(edge_idx);
        }

        let id = self.fresh_edge_id();
        let idx = self.graph.add_edge(from_idx, to_idx, Edge { id, from, to });
        self.edge_slots.insert(id, idx);
        self.edge_order.push(id);
        log::debug!("add edge {id}: {from} -> {to}");
        Some(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let idx = self.forget_edge(id)?;
        self.graph.remove_edge(idx)
    }

    /// Edges in paint order, oldest first.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_order.iter().filter_map(|id| self.edge(*id))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        let idx = *self.edge_slots.get(&id)?;
        self.graph.edge_weight(idx)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The single edge feeding `to`'s input port, if any.
    pub fn incoming_edge(&self, to: NodeId) -> Option<&Edge> {
        let idx = *self.index.get(&to)?;
        let edge_idx = self.graph.edges_directed(idx, Direction::Incoming).next()?.id();
        self.graph.edge_weight(edge_idx)
    }

    /// Output of the node wired into `to`'s input port.
    pub fn upstream_output(&self, to: NodeId) -> Option<&MediaRef> {
        let edge = self.incoming_edge(to)?;
        self.node(edge.from)?.data.output.as_ref()
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    /// Drop `id` from the lookup and paint order; the petgraph edge is the
    /// caller's to remove.
    fn forget_edge(&mut self, id: EdgeId) -> Option<EdgeIndex> {
        self.edge_order.retain(|e| *e != id);
        self.edge_slots.remove(&id)
    }

    fn fresh_node_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::intern(&self.ids.next_with_prefix("node"));
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn fresh_edge_id(&mut self) -> EdgeId {
        loop {
            let id = EdgeId::intern(&self.ids.next_with_prefix("e"));
            if !self.edge_slots.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;
    use pretty_assertions::assert_eq;

    fn three_nodes() -> (NodeGraph, NodeId, NodeId, NodeId) {
        let mut g = NodeGraph::new();
        let a = g.add_node_at(NodeKind::ImageGen, Point::new(0.0, 0.0));
        let b = g.add_node_at(NodeKind::VideoGen, Point::new(500.0, 0.0));
        let c = g.add_node_at(NodeKind::Media, Point::new(0.0, 600.0));
        (g, a, b, c)
    }

    #[test]
    fn add_node_maps_spawn_anchor_through_viewport() {
        let config = CanvasConfig::default();
        let mut vp = Viewport::new(&config);
        vp.set_pan(Vec2::new(-100.0, 50.0));
        vp.set_zoom(2.0);

        let mut g = NodeGraph::new();
        let id = g.add_node(NodeKind::Analyze, &vp, &config);
        let node = g.node(id).unwrap();
        assert_eq!(node.position, Point::new(150.0, 75.0));
        assert_eq!(vp.world_to_screen(node.position), Point::new(200.0, 200.0));
        assert_eq!(node.data.label, "Smart Analysis");
    }

    #[test]
    fn generated_ids_skip_seeded_ones() {
        let mut g = NodeGraph::with_starter_nodes();
        let id = g.add_node_at(NodeKind::Camera, Point::ZERO);
        assert_ne!(id.as_str(), "node-1");
        assert_ne!(id.as_str(), "node-2");
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn later_edge_replaces_earlier_into_same_target() {
        let (mut g, a, b, c) = three_nodes();
        g.add_edge(a, b).unwrap();
        g.add_edge(c, b).unwrap();

        let into_b: Vec<&Edge> = g.edges().filter(|e| e.to == b).collect();
        assert_eq!(into_b.len(), 1);
        assert_eq!(into_b[0].from, c);
    }

    #[test]
    fn replacement_edge_paints_last() {
        let (mut g, a, b, c) = three_nodes();
        let x = g.add_node_at(NodeKind::Camera, Point::new(0.0, 1200.0));
        let y = g.add_node_at(NodeKind::Analyze, Point::new(500.0, 1200.0));
        g.add_edge(a, b).unwrap();
        g.add_edge(x, y).unwrap();
        g.add_edge(c, b).unwrap();

        let pairs: Vec<(NodeId, NodeId)> = g.edges().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(x, y), (c, b)]);
    }

    #[test]
    fn removed_edges_leave_no_stale_lookup() {
        let (mut g, a, b, c) = three_nodes();
        let ab = g.add_edge(a, b).unwrap();
        let bc = g.add_edge(b, c).unwrap();
        g.remove_node(b);
        assert_eq!(g.edge(ab), None);
        assert_eq!(g.edge(bc), None);
        assert_eq!(g.edges().count(), 0);

        let ac = g.add_edge(a, c).unwrap();
        assert_eq!(g.edge(ac).map(|e| e.to), Some(c));
    }

    #[test]
    fn lookup_survives_direct_petgraph_edits() {
        let (mut g, a, b, _) = three_nodes();
        let idx = g.graph.node_indices().next().unwrap();
        g.graph.remove_node(idx);
        assert_eq!(g.node(a), None);
        assert_eq!(g.nodes().map(|n| n.id).next(), Some(b));
    }

    #[test]
    fn self_loop_is_rejected() {
        let (mut g, a, _, _) = three_nodes();
        assert_eq!(g.add_edge(a, a), None);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_pair_is_a_noop() {
        let (mut g, a, b, _) = three_nodes();
        let first = g.add_edge(a, b).unwrap();
        assert_eq!(g.add_edge(a, b), None);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.incoming_edge(b).map(|e| e.id), Some(first));
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let (mut g, a, _, _) = three_nodes();
        assert_eq!(g.add_edge(a, NodeId::intern("ghost")), None);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn one_source_may_feed_many_targets() {
        let (mut g, a, b, c) = three_nodes();
        g.add_edge(a, b).unwrap();
        g.add_edge(a, c).unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn remove_node_cascades_edges() {
        let (mut g, a, b, c) = three_nodes();
        g.add_edge(a, b).unwrap();
        g.add_edge(b, c).unwrap();
        g.add_edge(a, c).unwrap(); // replaces b -> c

        assert!(g.remove_node(a).is_some());
        assert!(g.edges().all(|e| !e.involves(a)));
        assert_eq!(g.edge_count(), 0);
        for e in g.edges() {
            assert!(g.contains(e.from) && g.contains(e.to));
        }
        assert!(g.nodes().all(|n| n.id != a));
    }

    #[test]
    fn remove_edge_by_id() {
        let (mut g, a, b, _) = three_nodes();
        let id = g.add_edge(a, b).unwrap();
        assert_eq!(g.remove_edge(id).map(|e| e.from), Some(a));
        assert_eq!(g.remove_edge(id), None);
    }

    #[test]
    fn mutators_report_unknown_ids() {
        let mut g = NodeGraph::new();
        let ghost = NodeId::intern("ghost");
        assert!(!g.update_node_position(ghost, Point::ZERO));
        assert!(!g.update_node_params(ghost, ParamsPatch::prompt("x")));
        assert!(!g.set_node_loading(ghost, true));
        assert!(!g.set_node_output(ghost, None));
        assert!(g.remove_node(ghost).is_none());
    }

    #[test]
    fn upstream_output_follows_incoming_edge() {
        let (mut g, a, b, _) = three_nodes();
        g.add_edge(a, b).unwrap();
        assert_eq!(g.upstream_output(b), None);
        g.set_node_output(a, Some(MediaRef::new("img://1")));
        assert_eq!(g.upstream_output(b), Some(&MediaRef::new("img://1")));
    }

    #[test]
    fn paint_order_appends_new_nodes() {
        let (g, a, b, c) = three_nodes();
        let order: Vec<NodeId> = g.nodes().map(|n| n.id).collect();
        assert_eq!(order, vec![a, b, c]);
    }
}
