pub mod engine;
pub mod input;
pub mod interaction;
pub mod runner;
pub mod service;
pub mod throttle;

pub use engine::{CanvasEngine, CanvasMutation};
pub use input::{InputEvent, PointerButton};
pub use interaction::{Gesture, InteractionSession, Response, ToolKind};
pub use runner::{NodeRunner, RunOutcome};
pub use service::{GenerationError, GenerationService, MediaPicker, PollingVideoClient, VideoPollConfig};
pub use throttle::{FrameHandle, FrameScheduler, FrameThrottle, ManualFrames};
