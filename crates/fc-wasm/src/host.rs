//! JS-backed collaborators.
//!
//! The host passes a backend object whose methods return Promises:
//!
//! | Method                                 | Resolves to                         |
//! |----------------------------------------|-------------------------------------|
//! | `generateImage(prompt, aspect)`        | media reference string              |
//! | `submitVideo(prompt, source, aspect)`  | job report `{id, done, uri, error}` |
//! | `pollVideo(id)`                        | job report                          |
//! | `downloadVideo(uri)`                   | media reference string              |
//! | `pickMedia()` (optional)               | media reference string or `null`    |
//!
//! Rejections are classified into [`GenerationError`]s by message.

use fc_core::{AspectRatio, MediaRef, NodeKind};
use fc_editor::service::{JobStatus, Sleep, VideoJob, VideoJobs, VideoRequest};
use fc_editor::{GenerationError, GenerationService, MediaPicker, PollingVideoClient, VideoPollConfig};
use js_sys::{Array, Function, Promise, Reflect};
use serde::Deserialize;
use std::time::Duration;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// How long kinds without a backend appear busy.
const PLACEHOLDER_MS: u32 = 1_000;

// ─── Calling into JS ────────────────────────────────────────────────────

fn method(backend: &JsValue, name: &str) -> Result<Function, JsValue> {
    Reflect::get(backend, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("backend.{name} is not a function")))
}

async fn call(f: &Function, args: &[JsValue]) -> Result<JsValue, GenerationError> {
    let args: Array = args.iter().collect();
    let returned = f.apply(&JsValue::NULL, &args).map_err(|e| classify(&js_message(&e)))?;
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|e| classify(&js_message(&e)))
}

fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Map a rejection message onto the error taxonomy.
pub fn classify(message: &str) -> GenerationError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("requested entity was not found")
        || lower.contains("api key")
        || lower.contains("unauthorized")
        || lower.contains("permission")
    {
        GenerationError::Auth(message.to_string())
    } else if lower.contains("quota") || lower.contains("429") || lower.contains("rate limit") {
        GenerationError::Quota(message.to_string())
    } else {
        GenerationError::Transport(message.to_string())
    }
}

fn media_from(value: JsValue) -> Result<MediaRef, GenerationError> {
    match value.as_string() {
        Some(s) if !s.is_empty() => Ok(MediaRef::new(s)),
        _ => Err(GenerationError::EmptyResponse),
    }
}

// ─── Video jobs ─────────────────────────────────────────────────────────

/// Job report as resolved by `submitVideo` / `pollVideo`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobReport {
    pub id: String,
    pub done: bool,
    pub uri: Option<String>,
    pub error: Option<String>,
}

impl JobReport {
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        serde_json::from_str(json).map_err(|e| GenerationError::Transport(format!("bad job report: {e}")))
    }

    pub fn status(&self) -> JobStatus {
        match (&self.error, self.done) {
            (Some(reason), _) => JobStatus::Failed(reason.clone()),
            (None, true) => JobStatus::Done(self.uri.clone().filter(|u| !u.is_empty())),
            (None, false) => JobStatus::Pending,
        }
    }

    fn from_js(value: &JsValue) -> Result<Self, GenerationError> {
        let json = js_sys::JSON::stringify(value)
            .map(String::from)
            .map_err(|e| classify(&js_message(&e)))?;
        Self::from_json(&json)
    }
}

pub struct JsVideoJobs {
    submit: Function,
    poll: Function,
    download: Function,
}

impl VideoJobs for JsVideoJobs {
    async fn submit(&self, request: VideoRequest<'_>) -> Result<VideoJob, GenerationError> {
        let source = request
            .source
            .map_or(JsValue::NULL, |s| JsValue::from_str(s.as_str()));
        let value = call(
            &self.submit,
            &[
                JsValue::from_str(request.prompt),
                source,
                JsValue::from_str(request.aspect.as_str()),
            ],
        )
        .await?;
        let report = JobReport::from_js(&value)?;
        Ok(VideoJob {
            status: report.status(),
            id: report.id,
        })
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, GenerationError> {
        let value = call(&self.poll, &[JsValue::from_str(job_id)]).await?;
        Ok(JobReport::from_js(&value)?.status())
    }

    async fn download(&self, location: &str) -> Result<MediaRef, GenerationError> {
        media_from(call(&self.download, &[JsValue::from_str(location)]).await?)
    }
}

pub struct TimerSleep;

impl Sleep for TimerSleep {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}

// ─── Service and picker ─────────────────────────────────────────────────

pub struct JsGeneration {
    image: Function,
    video: PollingVideoClient<JsVideoJobs, TimerSleep>,
}

impl JsGeneration {
    pub fn from_backend(backend: &JsValue, poll: VideoPollConfig) -> Result<Self, JsValue> {
        let jobs = JsVideoJobs {
            submit: method(backend, "submitVideo")?,
            poll: method(backend, "pollVideo")?,
            download: method(backend, "downloadVideo")?,
        };
        Ok(Self {
            image: method(backend, "generateImage")?,
            video: PollingVideoClient::new(jobs, TimerSleep, poll),
        })
    }
}

impl GenerationService for JsGeneration {
    async fn generate_image(&self, prompt: &str, aspect: AspectRatio) -> Result<MediaRef, GenerationError> {
        let value = call(
            &self.image,
            &[JsValue::from_str(prompt), JsValue::from_str(aspect.as_str())],
        )
        .await?;
        media_from(value)
    }

    async fn generate_video(
        &self,
        prompt: &str,
        source: Option<&MediaRef>,
        aspect: AspectRatio,
    ) -> Result<MediaRef, GenerationError> {
        self.video.generate(prompt, source, aspect).await
    }

    async fn placeholder(&self, kind: NodeKind) -> Result<(), GenerationError> {
        log::debug!("{kind}: no backend, placeholder delay");
        gloo_timers::future::TimeoutFuture::new(PLACEHOLDER_MS).await;
        Ok(())
    }
}

/// File picker; a backend without `pickMedia` never yields media.
pub struct JsPicker {
    pick: Option<Function>,
}

impl JsPicker {
    pub fn from_backend(backend: &JsValue) -> Self {
        Self {
            pick: method(backend, "pickMedia").ok(),
        }
    }
}

impl MediaPicker for JsPicker {
    async fn pick_media(&self) -> Option<MediaRef> {
        let pick = self.pick.as_ref()?;
        match call(pick, &[]).await {
            Ok(value) => media_from(value).ok(),
            Err(err) => {
                log::warn!("media picker failed: {err}");
                None
            }
        }
    }
}
