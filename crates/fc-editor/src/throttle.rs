//! Per-frame coalescing of pointer-driven updates.
//!
//! A pointer can fire many move events between two display refreshes.
//! `FrameThrottle` keeps only the latest update: scheduling a new one
//! cancels the frame requested for the previous one, so at most one
//! update is applied per frame.

/// Opaque id of a requested frame callback (`requestAnimationFrame` id in
/// the browser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Source of display-refresh callbacks.
pub trait FrameScheduler {
    /// Ask for one callback on the next frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request. Unknown or already-fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Holds at most one pending value, released on its frame.
#[derive(Debug)]
pub struct FrameThrottle<T> {
    pending: Option<(FrameHandle, T)>,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending value with `value` and request a fresh frame.
    pub fn schedule(&mut self, frames: &mut impl FrameScheduler, value: T) {
        if let Some((stale, _)) = self.pending.take() {
            frames.cancel_frame(stale);
            log::trace!("throttle: superseded frame {}", stale.0);
        }
        let handle = frames.request_frame();
        self.pending = Some((handle, value));
    }

    /// Frame callback. Yields the pending value if `handle` is the frame it
    /// is waiting for; a stale handle yields nothing.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<T> {
        match &self.pending {
            Some((h, _)) if *h == handle => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// Cancel the pending frame and hand back its value immediately.
    pub fn flush(&mut self, frames: &mut impl FrameScheduler) -> Option<T> {
        let (handle, value) = self.pending.take()?;
        frames.cancel_frame(handle);
        Some(value)
    }

    /// Cancel the pending frame and drop its value.
    pub fn cancel(&mut self, frames: &mut impl FrameScheduler) -> bool {
        self.flush(frames).is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A scheduler driven by hand: frames fire only when [`ManualFrames::fire`]
/// is called. Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct ManualFrames {
    next: u32,
    requested: Vec<FrameHandle>,
    cancelled: usize,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every outstanding request, as if one display refresh happened.
    pub fn fire(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.requested)
    }

    pub fn outstanding(&self) -> usize {
        self.requested.len()
    }

    /// How many requests were withdrawn before firing.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.requested.len();
        self.requested.retain(|h| *h != handle);
        self.cancelled += before - self.requested.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_latest_value_survives_a_frame() {
        let mut frames = ManualFrames::new();
        let mut throttle = FrameThrottle::new();
        for v in 1..=5 {
            throttle.schedule(&mut frames, v);
        }
        assert_eq!(frames.outstanding(), 1);
        assert_eq!(frames.cancelled(), 4);

        let fired: Vec<i32> = frames
            .fire()
            .into_iter()
            .filter_map(|h| throttle.on_frame(h))
            .collect();
        assert_eq!(fired, vec![5]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn stale_handle_yields_nothing() {
        let mut frames = ManualFrames::new();
        let mut throttle = FrameThrottle::new();
        throttle.schedule(&mut frames, "a");
        let stale = FrameHandle(1);
        throttle.schedule(&mut frames, "b");
        assert_eq!(throttle.on_frame(stale), None);
        assert!(throttle.is_pending());
    }

    #[test]
    fn flush_cancels_the_frame_and_returns_value() {
        let mut frames = ManualFrames::new();
        let mut throttle = FrameThrottle::new();
        throttle.schedule(&mut frames, 7);
        assert_eq!(throttle.flush(&mut frames), Some(7));
        assert_eq!(frames.outstanding(), 0);
        assert_eq!(throttle.flush(&mut frames), None);
        assert!(!throttle.cancel(&mut frames));
    }
}
