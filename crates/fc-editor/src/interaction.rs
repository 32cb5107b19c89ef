//! Pointer-driven gesture state machine.
//!
//! One `InteractionSession` per open canvas. It turns input events plus
//! a hit-test result into [`CanvasMutation`]s that the engine applies.
//!
//! | Press on            | Select tool       | Pan tool / middle button |
//! |---------------------|-------------------|--------------------------|
//! | **Node body**       | drag node         | consumed, no gesture     |
//! | **Input port**      | drag node         | consumed, no gesture     |
//! | **Output port**     | draw connection   | draw connection          |
//! | **Node control**    | left to the node  | left to the node         |
//! | **Empty canvas**    | nothing           | pan canvas               |
//!
//! Release, pointer-leave and blur always return the session to `Idle`.

use crate::engine::CanvasMutation;
use crate::input::{InputEvent, PointerButton};
use fc_core::{NodeGraph, NodeId, Point, Vec2, Viewport};
use fc_render::{GestureOverlay, HitTarget};
use smallvec::SmallVec;

/// The active tool determines how presses on nodes and canvas are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "select" => Some(Self::Select),
            "pan" => Some(Self::Pan),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Pan => "pan",
        }
    }
}

/// Gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Moving a node: screen anchor of the press and the node's world
    /// position at that moment.
    DraggingNode {
        id: NodeId,
        anchor: Point,
        original: Point,
    },
    /// Moving the canvas: screen anchor and pan offset at the press.
    PanningCanvas { anchor: Point, original_pan: Vec2 },
    /// Dragging a wire out of `source`'s output port.
    DrawingConnection { source: NodeId, pointer: Point },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// What the host should do after one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub mutations: SmallVec<[CanvasMutation; 2]>,
    /// Suppress the browser default (text selection, autoscroll).
    pub prevent_default: bool,
    /// Keep the event from reaching canvas-level handlers.
    pub stop_propagation: bool,
    /// Ephemeral visuals changed (preview wire, drag highlight).
    pub redraw: bool,
}

impl Response {
    fn consumed() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
            ..Self::default()
        }
    }

    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct InteractionSession {
    tool: ToolKind,
    gesture: Gesture,
}

impl InteractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// What the projector needs to draw the current gesture.
    pub fn overlay(&self) -> GestureOverlay {
        match self.gesture {
            Gesture::DraggingNode { id, .. } => GestureOverlay {
                dragging: Some(id),
                connecting: None,
            },
            Gesture::DrawingConnection { source, pointer } => GestureOverlay {
                dragging: None,
                connecting: Some((source, pointer)),
            },
            Gesture::Idle | Gesture::PanningCanvas { .. } => GestureOverlay::default(),
        }
    }

    /// Drop any gesture without producing mutations.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.gesture.is_idle();
        if was_active {
            log::debug!("gesture cancelled: {:?}", self.gesture);
        }
        self.gesture = Gesture::Idle;
        was_active
    }

    /// Feed one event. `hit` is what the event position landed on; it only
    /// matters for presses and releases.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        hit: HitTarget,
        graph: &NodeGraph,
        viewport: &Viewport,
    ) -> Response {
        match *event {
            InputEvent::PointerDown { pos, button } => self.press(pos, button, hit, graph, viewport),
            InputEvent::PointerMove { pos } => self.motion(pos, viewport),
            InputEvent::PointerUp { .. } => self.release(hit),
            InputEvent::PointerLeave | InputEvent::Blur => {
                let was_active = self.cancel();
                Response {
                    redraw: was_active,
                    ..Response::default()
                }
            }
            // zoom is the engine's business; it never touches the gesture
            InputEvent::Wheel { .. } => Response::default(),
        }
    }

    fn press(
        &mut self,
        pos: Point,
        button: PointerButton,
        hit: HitTarget,
        graph: &NodeGraph,
        viewport: &Viewport,
    ) -> Response {
        if !self.gesture.is_idle() {
            // a second button during a gesture; the first release ends it
            return Response::consumed();
        }

        let pan_press = self.tool == ToolKind::Pan || button == PointerButton::Middle;
        match hit {
            HitTarget::OutputPort(source) => {
                self.begin(Gesture::DrawingConnection { source, pointer: pos });
                Response {
                    redraw: true,
                    ..Response::consumed()
                }
            }
            HitTarget::NodeBody(id) | HitTarget::InputPort(id) => {
                if pan_press || button != PointerButton::Primary {
                    return Response::consumed();
                }
                let Some(node) = graph.node(id) else {
                    return Response::consumed();
                };
                self.begin(Gesture::DraggingNode {
                    id,
                    anchor: pos,
                    original: node.position,
                });
                Response {
                    redraw: true,
                    ..Response::consumed()
                }
            }
            HitTarget::NodeControl(_) => Response {
                stop_propagation: true,
                ..Response::default()
            },
            HitTarget::Canvas if pan_press => {
                self.begin(Gesture::PanningCanvas {
                    anchor: pos,
                    original_pan: viewport.pan(),
                });
                Response {
                    prevent_default: true,
                    ..Response::default()
                }
            }
            HitTarget::Canvas => Response::default(),
        }
    }

    fn motion(&mut self, pos: Point, viewport: &Viewport) -> Response {
        match &mut self.gesture {
            Gesture::Idle => Response::default(),
            Gesture::DraggingNode {
                id,
                anchor,
                original,
            } => {
                let world_delta = viewport.screen_delta_to_world(pos - *anchor);
                let mut response = Response::default();
                response.mutations.push(CanvasMutation::MoveNode {
                    id: *id,
                    to: *original + world_delta,
                });
                response
            }
            Gesture::PanningCanvas {
                anchor,
                original_pan,
            } => {
                let mut response = Response::default();
                response
                    .mutations
                    .push(CanvasMutation::SetPan(*original_pan + (pos - *anchor)));
                response
            }
            Gesture::DrawingConnection { pointer, .. } => {
                *pointer = pos;
                Response::redraw()
            }
        }
    }

    fn release(&mut self, hit: HitTarget) -> Response {
        let ended = std::mem::take(&mut self.gesture);
        if ended.is_idle() {
            return Response::default();
        }
        log::debug!("gesture ended: {ended:?} over {hit:?}");

        let mut response = Response::redraw();
        if let Gesture::DrawingConnection { source, .. } = ended
            && let HitTarget::InputPort(target) = hit
            && target != source
        {
            response.mutations.push(CanvasMutation::AddEdge {
                from: source,
                to: target,
            });
            response.stop_propagation = true;
        }
        response
    }

    fn begin(&mut self, gesture: Gesture) {
        log::debug!("gesture started: {gesture:?}");
        self.gesture = gesture;
    }
}
