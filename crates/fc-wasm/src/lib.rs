//! WASM bridge for Flow Canvas: exposes the canvas engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. A host page forwards pointer
//! and wheel events, registers an animation-frame tick, and either draws
//! with [`FlowCanvas::render`] or builds its own DOM from `frame_json`.

mod frames;
mod host;
mod render2d;

use fc_core::{AspectRatio, CanvasConfig, NodeId, NodeKind, ParamsPatch, Point};
use fc_editor::{
    CanvasEngine, InputEvent, NodeRunner, PointerButton, Response, RunOutcome, ToolKind,
    VideoPollConfig,
};
use fc_render::{HitTarget, curve_svg_path};
use frames::BrowserFrames;
use host::{JsGeneration, JsPicker};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

type JsRunner = NodeRunner<JsGeneration, JsPicker>;

/// The main WASM-facing canvas controller.
///
/// Owns the engine for one open canvas. All interaction from the host page
/// goes through this struct.
#[wasm_bindgen]
pub struct FlowCanvas {
    engine: CanvasEngine<BrowserFrames>,
    runner: Option<Rc<JsRunner>>,
    poll: VideoPollConfig,
    width: f64,
    height: f64,
    /// Dark mode flag. `true` = dark (default), `false` = light.
    dark_mode: bool,
}

/// What the host should do with the DOM event it just forwarded.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Disposition {
    prevent_default: bool,
    stop_propagation: bool,
    redraw: bool,
}

impl From<&Response> for Disposition {
    fn from(r: &Response) -> Self {
        Self {
            prevent_default: r.prevent_default,
            stop_propagation: r.stop_propagation,
            redraw: r.redraw,
        }
    }
}

#[derive(Serialize)]
struct EdgePath {
    id: String,
    d: String,
}

#[wasm_bindgen]
impl FlowCanvas {
    /// Create a controller with the given dimensions.
    ///
    /// `config_json` is an optional partial `CanvasConfig`; malformed JSON
    /// falls back to defaults. A `video_poll_ms` key overrides the video
    /// poll interval.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: Option<String>) -> Self {
        console_error_panic_hook_setup();

        let (config, poll) = match config_json.as_deref() {
            Some(json) => parse_config(json),
            None => (CanvasConfig::default(), VideoPollConfig::default()),
        };
        let mut engine = CanvasEngine::new(config, BrowserFrames::default());
        engine.open_project();

        Self {
            engine,
            runner: None,
            poll,
            width,
            height,
            dark_mode: true,
        }
    }

    /// Start over with the starter graph and an identity viewport.
    pub fn open_project(&mut self) {
        self.engine.open_project();
    }

    /// Register the generation backend (see the `host` module docs for
    /// the expected shape).
    pub fn set_backend(&mut self, backend: JsValue) -> Result<(), JsValue> {
        let service = JsGeneration::from_backend(&backend, self.poll)?;
        let picker = JsPicker::from_backend(&backend);
        self.runner = Some(Rc::new(NodeRunner::new(service, picker)));
        Ok(())
    }

    /// Register the function `requestAnimationFrame` should call. It must
    /// call `on_animation_frame` and redraw when that returns `true`.
    pub fn set_frame_callback(&mut self, tick: js_sys::Function) {
        self.engine.frames_mut().set_tick(tick);
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Render the canvas to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_frame(ctx, &self.engine.frame(), self.width, self.height, &theme);
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Projected frame as JSON, for hosts that draw nodes as DOM elements.
    pub fn frame_json(&self) -> String {
        serde_json::to_string(&self.engine.frame()).unwrap_or_else(|_| "{}".to_string())
    }

    /// `[{id, d}]` SVG path data for every visible edge.
    pub fn edge_paths_json(&self) -> String {
        let paths: Vec<EdgePath> = self
            .engine
            .frame()
            .edges
            .iter()
            .map(|e| EdgePath {
                id: e.id.as_str().to_string(),
                d: curve_svg_path(&e.curve),
            })
            .collect();
        serde_json::to_string(&paths).unwrap_or_else(|_| "[]".to_string())
    }

    /// Every node with its full data, in paint order.
    pub fn nodes_json(&self) -> String {
        let graph = self.engine.graph();
        let nodes: Vec<_> = graph.nodes().collect();
        serde_json::to_string(&nodes).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Pointer down at canvas-relative `(x, y)`; `button` is the DOM
    /// `MouseEvent.button`. Returns a JSON disposition.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, button: i16) -> String {
        let event = down_event(x, y, button);
        disposition(&self.engine.handle(event))
    }

    /// Pointer down on a known DOM target: `target` is one of `canvas`,
    /// `node`, `control`, `input`, `output`.
    pub fn handle_pointer_down_on(&mut self, x: f64, y: f64, button: i16, target: &str, node_id: &str) -> String {
        let event = down_event(x, y, button);
        let response = match parse_target(target, node_id) {
            Some(hit) => self.engine.handle_on(event, hit),
            None => self.engine.handle(event),
        };
        disposition(&response)
    }

    /// Returns `true` if the canvas needs a redraw now. Drag and pan
    /// updates arrive later through `on_animation_frame`.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.engine.handle(InputEvent::pointer_move(x, y)).redraw
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> String {
        disposition(&self.engine.handle(InputEvent::pointer_up(x, y)))
    }

    pub fn handle_pointer_up_on(&mut self, x: f64, y: f64, target: &str, node_id: &str) -> String {
        let event = InputEvent::pointer_up(x, y);
        let response = match parse_target(target, node_id) {
            Some(hit) => self.engine.handle_on(event, hit),
            None => self.engine.handle(event),
        };
        disposition(&response)
    }

    pub fn handle_pointer_leave(&mut self) -> bool {
        self.engine.handle(InputEvent::PointerLeave).redraw
    }

    pub fn handle_blur(&mut self) -> bool {
        self.engine.handle(InputEvent::Blur).redraw
    }

    /// Wheel over the canvas. Returns `true` if the zoom changed.
    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.engine
            .handle(InputEvent::Wheel {
                pos: Point::new(x, y),
                delta_y,
            })
            .redraw
    }

    /// Animation-frame tick. Returns `true` if the canvas needs a redraw.
    pub fn on_animation_frame(&mut self) -> bool {
        match self.engine.frames_mut().take_due() {
            Some(handle) => self.engine.on_frame(handle),
            None => false,
        }
    }

    /// For hosts without a frame callback: is an update waiting for a frame?
    pub fn frame_requested(&self) -> bool {
        self.engine.frames().is_pending()
    }

    // ─── Tools and zoom ──────────────────────────────────────────────────

    /// Switch tool by name (`select` / `pan`). Returns `false` if unknown.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(tool) => {
                self.engine.set_tool(tool);
                true
            }
            None => false,
        }
    }

    pub fn get_tool_name(&self) -> String {
        self.engine.tool().as_str().to_string()
    }

    pub fn reset_zoom(&mut self) {
        self.engine.reset_zoom();
    }

    pub fn zoom_percent(&self) -> u32 {
        self.engine.viewport().zoom_percent()
    }

    /// Zoom relative to the maximum, for the toolbar gauge.
    pub fn zoom_fraction(&self) -> f64 {
        self.engine.viewport().zoom_fraction()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Add a node by kind name (`IMAGE_GEN`, `video_gen`, ...). Returns the
    /// new id, or an empty string for an unknown kind.
    pub fn add_node(&mut self, kind: &str) -> String {
        match NodeKind::from_name(kind) {
            Some(kind) => self.engine.add_node(kind).as_str().to_string(),
            None => String::new(),
        }
    }

    pub fn remove_node(&mut self, node_id: &str) -> bool {
        self.engine.remove_node(NodeId::intern(node_id))
    }

    pub fn set_prompt(&mut self, node_id: &str, prompt: &str) -> bool {
        self.engine.set_prompt(NodeId::intern(node_id), prompt)
    }

    /// `1:1`, `16:9` or `9:16`. Returns `false` for anything else.
    pub fn set_aspect_ratio(&mut self, node_id: &str, ratio: &str) -> bool {
        let Some(ratio) = parse_aspect(ratio) else {
            return false;
        };
        self.engine.update_params(
            NodeId::intern(node_id),
            ParamsPatch {
                aspect_ratio: Some(ratio),
                ..ParamsPatch::default()
            },
        )
    }

    /// Run a node. Resolves to the outcome name (`completed`, `failed`,
    /// ...) once the graph has been updated; never rejects for service
    /// failures. Rejects only if no backend was registered.
    pub fn run_node(&self, node_id: &str) -> js_sys::Promise {
        let Some(runner) = self.runner.clone() else {
            return js_sys::Promise::reject(&JsValue::from_str("no backend registered"));
        };
        let graph = self.engine.graph_handle();
        let id = NodeId::intern(node_id);
        wasm_bindgen_futures::future_to_promise(async move {
            let outcome = runner.run(&graph, id).await;
            Ok(JsValue::from_str(outcome_name(&outcome)))
        })
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn down_event(x: f64, y: f64, button: i16) -> InputEvent {
    InputEvent::PointerDown {
        pos: Point::new(x, y),
        button: PointerButton::from_dom(button),
    }
}

fn disposition(response: &Response) -> String {
    serde_json::to_string(&Disposition::from(response)).unwrap_or_else(|_| "{}".to_string())
}

fn parse_target(target: &str, node_id: &str) -> Option<HitTarget> {
    let id = || NodeId::intern(node_id);
    match target {
        "canvas" => Some(HitTarget::Canvas),
        "node" => Some(HitTarget::NodeBody(id())),
        "control" => Some(HitTarget::NodeControl(id())),
        "input" => Some(HitTarget::InputPort(id())),
        "output" => Some(HitTarget::OutputPort(id())),
        _ => None,
    }
}

fn parse_aspect(ratio: &str) -> Option<AspectRatio> {
    [AspectRatio::Square, AspectRatio::Landscape, AspectRatio::Portrait]
        .into_iter()
        .find(|r| r.as_str() == ratio)
}

fn parse_config(json: &str) -> (CanvasConfig, VideoPollConfig) {
    let config = CanvasConfig::from_json(json).unwrap_or_else(|e| {
        log::warn!("invalid canvas config, using defaults: {e}");
        CanvasConfig::default()
    });
    let poll = serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("video_poll_ms")?.as_u64())
        .map(|ms| VideoPollConfig { poll_interval_ms: ms })
        .unwrap_or_default();
    (config, poll)
}

fn outcome_name(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed(_) => "completed",
        RunOutcome::Settled => "settled",
        RunOutcome::Picked(_) => "picked",
        RunOutcome::PickCancelled => "pick-cancelled",
        RunOutcome::Failed(_) => "failed",
        RunOutcome::Busy => "busy",
        RunOutcome::NodeMissing => "missing",
        RunOutcome::Detached => "detached",
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Flow Canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
