//! `requestAnimationFrame`-backed frame scheduler.
//!
//! The host registers a tick function once; each requested frame asks the
//! browser to call it on the next refresh, and the tick calls back into
//! `FlowCanvas::on_animation_frame`. Without a tick function (or outside a
//! window) the host polls `frame_requested` instead.

use fc_editor::{FrameHandle, FrameScheduler};

#[derive(Debug, Default)]
pub struct BrowserFrames {
    next: u32,
    /// Outstanding request and its browser callback id, if one was made.
    pending: Option<(FrameHandle, Option<i32>)>,
    tick: Option<js_sys::Function>,
}

impl BrowserFrames {
    pub fn set_tick(&mut self, tick: js_sys::Function) {
        self.tick = Some(tick);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The frame has arrived: hand back its handle.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take().map(|(handle, _)| handle)
    }
}

impl FrameScheduler for BrowserFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next = self.next.wrapping_add(1);
        let handle = FrameHandle(self.next);
        let raf = self
            .tick
            .as_ref()
            .and_then(|tick| web_sys::window()?.request_animation_frame(tick).ok());
        self.pending = Some((handle, raf));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let Some((pending, raf)) = self.pending else {
            return;
        };
        if pending != handle {
            return;
        }
        self.pending = None;
        if let Some(id) = raf
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }
    }
}
