//! External collaborators: the generation backend and the media picker.
//!
//! The editor treats both as black boxes that eventually return a media
//! reference or fail. Video generation is a long-running job; the
//! [`PollingVideoClient`] drives any submit-then-poll backend to completion
//! without knowing its wire protocol.

use fc_core::{AspectRatio, MediaRef, NodeKind};
use serde::Deserialize;
use std::time::Duration;

/// Why a generation call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not authorized: {0}")]
    Auth(String),
    #[error("quota exhausted: {0}")]
    Quota(String),
    #[error("service returned no media")]
    EmptyResponse,
    #[error("job {job} failed: {reason}")]
    JobFailed { job: String, reason: String },
}

/// The generation backend.
#[allow(async_fn_in_trait)]
pub trait GenerationService {
    async fn generate_image(&self, prompt: &str, aspect: AspectRatio) -> Result<MediaRef, GenerationError>;

    /// `source` is the upstream image, if the node has one wired in.
    async fn generate_video(
        &self,
        prompt: &str,
        source: Option<&MediaRef>,
        aspect: AspectRatio,
    ) -> Result<MediaRef, GenerationError>;

    /// Stand-in step for kinds with no backend yet (camera, edit, analyze).
    async fn placeholder(&self, kind: NodeKind) -> Result<(), GenerationError>;
}

/// Local file selection for import nodes.
#[allow(async_fn_in_trait)]
pub trait MediaPicker {
    /// `None` when the user dismissed the picker.
    async fn pick_media(&self) -> Option<MediaRef>;
}

// ─── Submit-then-poll video ─────────────────────────────────────────────

/// State of a video job as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    /// Finished; carries the download location if the job produced one.
    Done(Option<String>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub id: String,
    pub status: JobStatus,
}

/// One video request as handed to the backend.
#[derive(Debug, Clone, Copy)]
pub struct VideoRequest<'a> {
    pub prompt: &'a str,
    pub source: Option<&'a MediaRef>,
    pub aspect: AspectRatio,
}

/// A job-based video backend.
#[allow(async_fn_in_trait)]
pub trait VideoJobs {
    async fn submit(&self, request: VideoRequest<'_>) -> Result<VideoJob, GenerationError>;
    async fn poll(&self, job_id: &str) -> Result<JobStatus, GenerationError>;
    /// Turn a finished job's download location into a playable reference.
    async fn download(&self, location: &str) -> Result<MediaRef, GenerationError>;
}

/// Async timer.
#[allow(async_fn_in_trait)]
pub trait Sleep {
    async fn sleep(&self, duration: Duration);
}

/// Poll settings for [`PollingVideoClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VideoPollConfig {
    pub poll_interval_ms: u64,
}

impl Default for VideoPollConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
        }
    }
}

impl VideoPollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Submits a video job, sleeps between polls until the job settles, then
/// resolves its download.
pub struct PollingVideoClient<J, S> {
    jobs: J,
    sleep: S,
    config: VideoPollConfig,
}

impl<J: VideoJobs, S: Sleep> PollingVideoClient<J, S> {
    pub fn new(jobs: J, sleep: S, config: VideoPollConfig) -> Self {
        Self {
            jobs,
            sleep,
            config,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        source: Option<&MediaRef>,
        aspect: AspectRatio,
    ) -> Result<MediaRef, GenerationError> {
        let job = self
            .jobs
            .submit(VideoRequest {
                prompt,
                source,
                aspect,
            })
            .await?;
        log::debug!("video job {} submitted", job.id);

        let mut status = job.status;
        let mut polls = 0u32;
        loop {
            match status {
                JobStatus::Pending => {
                    self.sleep.sleep(self.config.interval()).await;
                    polls += 1;
                    status = self.jobs.poll(&job.id).await?;
                    log::trace!("video job {} poll {polls}: {status:?}", job.id);
                }
                JobStatus::Done(Some(location)) => {
                    log::debug!("video job {} done after {polls} polls", job.id);
                    return self.jobs.download(&location).await;
                }
                JobStatus::Done(None) => return Err(GenerationError::EmptyResponse),
                JobStatus::Failed(reason) => {
                    return Err(GenerationError::JobFailed { job: job.id, reason });
                }
            }
        }
    }
}
