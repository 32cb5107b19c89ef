//! Node execution: turn a "run" request on a node into a service call and
//! write the result back into the graph.
//!
//! Runs hold only a `Weak` graph handle and never keep a borrow across an
//! await, so the canvas stays fully interactive while generations are in
//! flight and a run that outlives its canvas ends quietly.
//!
//! Service failures stop here: the node's `loading` flag is cleared, the
//! error text is recorded on the node, and its previous output is kept.

use crate::service::{GenerationError, GenerationService, MediaPicker};
use fc_core::{AspectRatio, MediaRef, NodeGraph, NodeId, NodeKind};
use std::cell::RefCell;
use std::rc::Weak;

/// Prompt sent when an image node's prompt box is empty.
pub const DEFAULT_IMAGE_PROMPT: &str = "Masterpiece";
/// Prompt sent when a video node's prompt box is empty.
pub const DEFAULT_VIDEO_PROMPT: &str = "Dynamic";

/// How a run ended. Informational; the graph already reflects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The service produced media, now the node's output.
    Completed(MediaRef),
    /// Placeholder step finished; the node is idle again.
    Settled,
    /// Import node: the picked media became the output.
    Picked(MediaRef),
    /// Import node: the picker was dismissed.
    PickCancelled,
    /// The service failed; the message was recorded on the node.
    Failed(GenerationError),
    /// The node was already running.
    Busy,
    /// No such node (never existed, or deleted while running).
    NodeMissing,
    /// The canvas was closed.
    Detached,
}

/// What to send to the service, captured before the first await.
#[derive(Debug, Clone)]
enum Job {
    Image {
        prompt: String,
        aspect: AspectRatio,
    },
    Video {
        prompt: String,
        source: Option<MediaRef>,
        aspect: AspectRatio,
    },
    Placeholder(NodeKind),
}

enum Start {
    Pick,
    Run(Job),
    Stop(RunOutcome),
}

pub struct NodeRunner<S, P> {
    service: S,
    picker: P,
}

impl<S: GenerationService, P: MediaPicker> NodeRunner<S, P> {
    pub fn new(service: S, picker: P) -> Self {
        Self { service, picker }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run node `id` to completion.
    pub async fn run(&self, graph: &Weak<RefCell<NodeGraph>>, id: NodeId) -> RunOutcome {
        match Self::start(graph, id) {
            Start::Stop(outcome) => outcome,
            Start::Pick => self.pick(graph, id).await,
            Start::Run(job) => {
                let result = self.execute(&job).await;
                Self::finish(graph, id, result)
            }
        }
    }

    /// Mark the node busy and snapshot everything the call needs.
    fn start(graph: &Weak<RefCell<NodeGraph>>, id: NodeId) -> Start {
        let Some(graph) = graph.upgrade() else {
            return Start::Stop(RunOutcome::Detached);
        };
        let mut graph = graph.borrow_mut();
        let Some(node) = graph.node(id) else {
            return Start::Stop(RunOutcome::NodeMissing);
        };
        if node.kind.is_import() {
            return Start::Pick;
        }
        if node.data.loading {
            log::debug!("run {id}: already running");
            return Start::Stop(RunOutcome::Busy);
        }

        let params = &node.data.params;
        let job = match node.kind {
            NodeKind::ImageGen => Job::Image {
                prompt: prompt_or(&params.prompt, DEFAULT_IMAGE_PROMPT),
                aspect: params.aspect_ratio.unwrap_or_default(),
            },
            NodeKind::VideoGen => Job::Video {
                prompt: prompt_or(&params.prompt, DEFAULT_VIDEO_PROMPT),
                source: graph.upstream_output(id).cloned(),
                aspect: params
                    .aspect_ratio
                    .unwrap_or(AspectRatio::Landscape)
                    .for_video(),
            },
            kind => Job::Placeholder(kind),
        };

        graph.set_node_error(id, None);
        graph.set_node_loading(id, true);
        log::debug!("run {id}: {job:?}");
        Start::Run(job)
    }

    async fn execute(&self, job: &Job) -> Result<Option<MediaRef>, GenerationError> {
        match job {
            Job::Image { prompt, aspect } => self.service.generate_image(prompt, *aspect).await.map(Some),
            Job::Video {
                prompt,
                source,
                aspect,
            } => self
                .service
                .generate_video(prompt, source.as_ref(), *aspect)
                .await
                .map(Some),
            Job::Placeholder(kind) => self.service.placeholder(*kind).await.map(|()| None),
        }
    }

    fn finish(
        graph: &Weak<RefCell<NodeGraph>>,
        id: NodeId,
        result: Result<Option<MediaRef>, GenerationError>,
    ) -> RunOutcome {
        let Some(graph) = graph.upgrade() else {
            log::debug!("run {id}: canvas closed before completion");
            return RunOutcome::Detached;
        };
        let mut graph = graph.borrow_mut();
        if !graph.set_node_loading(id, false) {
            log::debug!("run {id}: node deleted before completion");
            return RunOutcome::NodeMissing;
        }

        match result {
            Ok(Some(media)) => {
                log::info!("run {id}: produced {}", summarize(&media));
                graph.set_node_output(id, Some(media.clone()));
                RunOutcome::Completed(media)
            }
            Ok(None) => RunOutcome::Settled,
            Err(err) => {
                log::warn!("run {id} failed: {err}");
                graph.set_node_error(id, Some(err.to_string()));
                RunOutcome::Failed(err)
            }
        }
    }

    async fn pick(&self, graph: &Weak<RefCell<NodeGraph>>, id: NodeId) -> RunOutcome {
        let Some(media) = self.picker.pick_media().await else {
            return RunOutcome::PickCancelled;
        };
        let Some(graph) = graph.upgrade() else {
            return RunOutcome::Detached;
        };
        if !graph.borrow_mut().set_node_output(id, Some(media.clone())) {
            return RunOutcome::NodeMissing;
        }
        log::info!("run {id}: imported {}", summarize(&media));
        RunOutcome::Picked(media)
    }
}

fn prompt_or(prompt: &str, fallback: &str) -> String {
    if prompt.is_empty() {
        fallback.to_string()
    } else {
        prompt.to_string()
    }
}

/// Data URIs can be megabytes; keep log lines short.
fn summarize(media: &MediaRef) -> String {
    if media.is_data_uri() {
        let len = media.data_payload().map_or(0, str::len);
        format!("inline media ({len} bytes base64)")
    } else {
        media.to_string()
    }
}
