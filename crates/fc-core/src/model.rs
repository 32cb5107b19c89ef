//! Node and edge data model for the flow canvas.
//!
//! Nodes live in world space: `position` is the top-left corner of a fixed
//! size card. Edges are weak id relations from a node's output port to
//! another node's single input port.

use crate::id::{EdgeId, NodeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of node types offered by the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Local media import (file picker).
    Media,
    /// Text-to-image generation.
    ImageGen,
    /// Virtual camera parameters.
    Camera,
    /// Video generation, optionally seeded by an upstream image.
    VideoGen,
    /// Masked image touch-up.
    ImageEdit,
    /// Media understanding.
    Analyze,
}

impl NodeKind {
    /// Sidebar order.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Media,
        NodeKind::ImageGen,
        NodeKind::Camera,
        NodeKind::VideoGen,
        NodeKind::ImageEdit,
        NodeKind::Analyze,
    ];

    /// Display label given to new nodes of this kind.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Media => "Media Asset",
            NodeKind::ImageGen => "Image Generation",
            NodeKind::Camera => "Virtual Camera",
            NodeKind::VideoGen => "Video Synthesis",
            NodeKind::ImageEdit => "Frame Touch-up",
            NodeKind::Analyze => "Smart Analysis",
        }
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Media => "MEDIA",
            NodeKind::ImageGen => "IMAGE_GEN",
            NodeKind::Camera => "CAMERA",
            NodeKind::VideoGen => "VIDEO_GEN",
            NodeKind::ImageEdit => "IMAGE_EDIT",
            NodeKind::Analyze => "ANALYZE",
        }
    }

    /// Parse a wire name (`"VIDEO_GEN"`). Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }

    /// Import nodes are filled by the file picker, never by a service call.
    pub fn is_import(self) -> bool {
        matches!(self, NodeKind::Media)
    }

    /// Kinds that feed their single upstream output into the service call.
    pub fn consumes_upstream(self) -> bool {
        matches!(self, NodeKind::VideoGen)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Parameters ──────────────────────────────────────────────────────────

/// Output aspect ratio requested from the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }

    /// Video output only supports the two widescreen orientations.
    pub fn for_video(self) -> Self {
        match self {
            AspectRatio::Square => AspectRatio::Landscape,
            other => other,
        }
    }
}

/// Generation parameters edited on the node card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeParams {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

/// A partial update to `NodeParams`. Only `Some` fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsPatch {
    pub prompt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
}

impl ParamsPatch {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Shallow-merge into `params`.
    pub fn apply_to(self, params: &mut NodeParams) {
        if let Some(prompt) = self.prompt {
            params.prompt = prompt;
        }
        if let Some(ratio) = self.aspect_ratio {
            params.aspect_ratio = Some(ratio);
        }
    }
}

// ─── Media references ────────────────────────────────────────────────────

/// Opaque reference to generated or imported media: a URL, an object URL,
/// or an embedded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// The base64 payload of a `data:...;base64,` URI.
    pub fn data_payload(&self) -> Option<&str> {
        if !self.is_data_uri() {
            return None;
        }
        self.0.split_once(',').map(|(_, payload)| payload)
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─── Nodes and edges ─────────────────────────────────────────────────────

/// Mutable payload of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    pub params: NodeParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<MediaRef>,
    pub loading: bool,
    /// Message from the last failed run. Cleared when a new run starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// World-space top-left corner.
    pub position: Point,
    pub data: NodeData,
}

impl CanvasNode {
    pub fn new(id: NodeId, kind: NodeKind, position: Point) -> Self {
        Self {
            id,
            kind,
            position,
            data: NodeData {
                label: kind.label().to_string(),
                ..NodeData::default()
            },
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.data.params.prompt = prompt.into();
        self
    }
}

/// A connection from `from`'s output port to `to`'s input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn involves(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}
