//! Canvas engine: the single owner of one open canvas.
//!
//! Holds the graph store, the viewport, the interaction session and the
//! per-frame throttle. Hosts feed it input events and frame callbacks and
//! read back a projected [`Frame`] to draw.
//!
//! - Drag and pan updates are coalesced: each pointer move replaces the
//!   pending update and re-requests a frame, so only the latest move in a
//!   frame is applied.
//! - Everything else (new edges, wheel zoom, node edits) applies at once.
//!
//! The graph lives behind `Rc<RefCell<_>>` so async node runs can hold a
//! `Weak` handle and write their results back when they finish.

use crate::input::InputEvent;
use crate::interaction::{Gesture, InteractionSession, Response, ToolKind};
use crate::throttle::{FrameHandle, FrameScheduler, FrameThrottle};
use fc_core::{CanvasConfig, NodeGraph, NodeId, NodeKind, ParamsPatch, Point, Vec2, Viewport};
use fc_render::{Frame, HitTarget, hit_test, project_frame};
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

/// A change requested by a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasMutation {
    /// Place a node at an absolute world position.
    MoveNode { id: NodeId, to: Point },
    /// Replace the viewport pan offset.
    SetPan(Vec2),
    /// Wire `from`'s output into `to`'s input.
    AddEdge { from: NodeId, to: NodeId },
}

impl CanvasMutation {
    /// Continuous updates that only need to land once per frame.
    pub fn is_coalesced(&self) -> bool {
        matches!(self, Self::MoveNode { .. } | Self::SetPan(_))
    }
}

pub struct CanvasEngine<F: FrameScheduler> {
    graph: Rc<RefCell<NodeGraph>>,
    viewport: Viewport,
    config: CanvasConfig,
    session: InteractionSession,
    throttle: FrameThrottle<CanvasMutation>,
    frames: F,
}

impl<F: FrameScheduler> CanvasEngine<F> {
    /// An engine over an empty graph.
    pub fn new(config: CanvasConfig, frames: F) -> Self {
        let config = config.sanitized();
        Self {
            graph: Rc::new(RefCell::new(NodeGraph::new())),
            viewport: Viewport::new(&config),
            config,
            session: InteractionSession::new(),
            throttle: FrameThrottle::new(),
            frames,
        }
    }

    /// Open a project: fresh viewport, fresh starter graph.
    ///
    /// The previous graph is dropped, so runs still in flight against it
    /// finish silently instead of writing into the new one.
    pub fn open_project(&mut self) {
        self.throttle.cancel(&mut self.frames);
        self.session.cancel();
        self.viewport.reset();
        self.graph = Rc::new(RefCell::new(NodeGraph::with_starter_nodes()));
        log::debug!("project opened");
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> Ref<'_, NodeGraph> {
        self.graph.borrow()
    }

    /// Handle for async work that must not keep the canvas alive.
    pub fn graph_handle(&self) -> Weak<RefCell<NodeGraph>> {
        Rc::downgrade(&self.graph)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn gesture(&self) -> &Gesture {
        self.session.gesture()
    }

    pub fn tool(&self) -> ToolKind {
        self.session.tool()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        log::debug!("tool: {}", tool.as_str());
        self.session.set_tool(tool);
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    /// Hit test a screen point against the current graph and viewport.
    pub fn hit(&self, screen: Point) -> HitTarget {
        hit_test(&self.graph.borrow(), &self.viewport, &self.config, screen)
    }

    /// Screen-space geometry for the current state.
    pub fn frame(&self) -> Frame {
        project_frame(
            &self.graph.borrow(),
            &self.viewport,
            &self.config,
            &self.session.overlay(),
        )
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle an event, hit testing its position against the graph.
    pub fn handle(&mut self, event: InputEvent) -> Response {
        let hit = match event {
            InputEvent::PointerDown { pos, .. } | InputEvent::PointerUp { pos } => self.hit(pos),
            _ => HitTarget::Canvas,
        };
        self.handle_on(event, hit)
    }

    /// Handle an event whose target the host already knows (a DOM host
    /// gets it from the element the event fired on).
    pub fn handle_on(&mut self, event: InputEvent, hit: HitTarget) -> Response {
        if let InputEvent::Wheel { delta_y, .. } = event {
            let changed = self
                .viewport
                .zoom_by_wheel(delta_y, self.config.wheel_sensitivity);
            return Response {
                redraw: changed,
                ..Response::default()
            };
        }

        if event.ends_gesture() {
            // the last move before release must not be lost
            if let Some(pending) = self.throttle.flush(&mut self.frames) {
                self.apply(pending);
            }
        }

        let mut response = {
            let graph = self.graph.borrow();
            self.session.handle(&event, hit, &graph, &self.viewport)
        };

        for mutation in std::mem::take(&mut response.mutations) {
            if mutation.is_coalesced() {
                self.throttle.schedule(&mut self.frames, mutation);
            } else {
                self.apply(mutation);
                response.redraw = true;
            }
        }
        response
    }

    /// Display-refresh callback. Returns `true` when something moved and
    /// the host should redraw.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        match self.throttle.on_frame(handle) {
            Some(mutation) => {
                log::trace!("frame {}: {mutation:?}", handle.0);
                self.apply(mutation);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, mutation: CanvasMutation) {
        match mutation {
            CanvasMutation::MoveNode { id, to } => {
                self.graph.borrow_mut().update_node_position(id, to);
            }
            CanvasMutation::SetPan(pan) => self.viewport.set_pan(pan),
            CanvasMutation::AddEdge { from, to } => {
                self.graph.borrow_mut().add_edge(from, to);
            }
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Add a node where the spawn anchor currently shows.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.graph
            .borrow_mut()
            .add_node(kind, &self.viewport, &self.config)
    }

    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let removed = self.graph.borrow_mut().remove_node(id).is_some();
        let involved = match *self.session.gesture() {
            Gesture::DraggingNode { id: dragged, .. } => dragged == id,
            Gesture::DrawingConnection { source, .. } => source == id,
            _ => false,
        };
        if removed && involved {
            self.throttle.cancel(&mut self.frames);
            self.session.cancel();
        }
        removed
    }

    pub fn set_prompt(&mut self, id: NodeId, prompt: &str) -> bool {
        self.graph
            .borrow_mut()
            .update_node_params(id, ParamsPatch::prompt(prompt))
    }

    pub fn update_params(&mut self, id: NodeId, patch: ParamsPatch) -> bool {
        self.graph.borrow_mut().update_node_params(id, patch)
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset_zoom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::ManualFrames;
    use pretty_assertions::assert_eq;

    fn engine() -> CanvasEngine<ManualFrames> {
        let mut e = CanvasEngine::new(CanvasConfig::default(), ManualFrames::new());
        e.open_project();
        e
    }

    #[test]
    fn unsanitized_config_is_accepted() {
        let config = CanvasConfig {
            zoom_min: 0.0,
            zoom_max: -3.0,
            ..CanvasConfig::default()
        };
        let mut e = CanvasEngine::new(config, ManualFrames::new());
        assert_eq!(e.config().zoom_min, 0.15);
        assert_eq!(e.config().zoom_max, 0.15);
        e.handle(InputEvent::Wheel {
            pos: Point::ZERO,
            delta_y: -500.0,
        });
        assert_eq!(e.viewport().zoom(), 0.15);
    }

    fn node1() -> NodeId {
        NodeId::intern("node-1")
    }

    #[test]
    fn open_project_seeds_starter_pair_and_resets_view() {
        let mut e = engine();
        e.handle(InputEvent::Wheel {
            pos: Point::ZERO,
            delta_y: -500.0,
        });
        e.open_project();
        assert_eq!(e.graph().node_count(), 2);
        assert_eq!(e.viewport().zoom(), 1.0);
        assert_eq!(e.viewport().pan(), Vec2::ZERO);
    }

    #[test]
    fn drag_moves_apply_once_per_frame() {
        let mut e = engine();
        // node-1 body at (100,150)..(420,590)
        e.handle(InputEvent::pointer_down(200.0, 200.0));
        for x in [210.0, 220.0, 230.0, 240.0] {
            e.handle(InputEvent::pointer_move(x, 200.0));
        }
        assert_eq!(e.graph().node(node1()).unwrap().position, Point::new(100.0, 150.0));
        assert_eq!(e.frames_mut().outstanding(), 1);

        let handles = e.frames_mut().fire();
        let redraws = handles.into_iter().filter(|h| e.on_frame(*h)).count();
        assert_eq!(redraws, 1);
        assert_eq!(e.graph().node(node1()).unwrap().position, Point::new(140.0, 150.0));
    }

    #[test]
    fn release_flushes_pending_move() {
        let mut e = engine();
        e.handle(InputEvent::pointer_down(200.0, 200.0));
        e.handle(InputEvent::pointer_move(260.0, 230.0));
        e.handle(InputEvent::pointer_up(260.0, 230.0));
        assert_eq!(e.graph().node(node1()).unwrap().position, Point::new(160.0, 180.0));
        assert_eq!(e.frames_mut().outstanding(), 0);
        assert!(e.gesture().is_idle());
    }

    #[test]
    fn wheel_zooms_mid_gesture_without_ending_it() {
        let mut e = engine();
        e.set_tool(ToolKind::Pan);
        e.handle(InputEvent::pointer_down(0.0, 0.0));
        let r = e.handle(InputEvent::Wheel {
            pos: Point::ZERO,
            delta_y: -100.0,
        });
        assert!(r.redraw);
        assert!((e.viewport().zoom() - 1.1).abs() < 1e-9);
        assert!(matches!(e.gesture(), Gesture::PanningCanvas { .. }));
    }

    #[test]
    fn removing_dragged_node_cancels_gesture() {
        let mut e = engine();
        e.handle(InputEvent::pointer_down(200.0, 200.0));
        e.handle(InputEvent::pointer_move(250.0, 200.0));
        assert!(e.remove_node(node1()));
        assert!(e.gesture().is_idle());
        assert_eq!(e.frames_mut().outstanding(), 0);
    }

    #[test]
    fn add_node_lands_under_spawn_anchor() {
        let mut e = engine();
        e.set_tool(ToolKind::Pan);
        e.handle(InputEvent::pointer_down(0.0, 0.0));
        e.handle(InputEvent::pointer_move(-100.0, -50.0));
        e.handle(InputEvent::pointer_up(-100.0, -50.0));
        assert_eq!(e.viewport().pan(), Vec2::new(-100.0, -50.0));
        let id = e.add_node(NodeKind::Camera);
        let pos = e.graph().node(id).unwrap().position;
        assert_eq!(e.viewport().world_to_screen(pos), Point::new(200.0, 200.0));
    }
}
