//! Progress reporting: adapts per-chunk byte counts into the
//! cancellable callback contract.
//!
//! The handler receives four counters (download total/now, upload
//! total/now) and returns `true` to continue or `false` to abort the
//! transfer. It runs synchronously on the transferring thread. A panic
//! inside the handler is caught, recorded, and treated as an abort.

use std::panic::{self, AssertUnwindSafe};

use crate::types::TransferDirection;

/// Receiver for transfer progress events.
///
/// Counters are monotonically non-decreasing within one transfer and
/// `now <= total` whenever the total is known. A zero total means the
/// size is unknown. The handler runs on the thread driving the
/// transfer and stalls it while it runs, so it must not block for an
/// unbounded duration.
pub trait ProgressHandler: Send {
    fn on_progress(
        &mut self,
        download_total: u64,
        download_now: u64,
        upload_total: u64,
        upload_now: u64,
    ) -> bool;
}

impl<F> ProgressHandler for F
where
    F: FnMut(u64, u64, u64, u64) -> bool + Send,
{
    fn on_progress(
        &mut self,
        download_total: u64,
        download_now: u64,
        upload_total: u64,
        upload_now: u64,
    ) -> bool {
        self(download_total, download_now, upload_total, upload_now)
    }
}

/// Per-transfer reporter wrapping the session's handler slot.
pub(crate) struct ProgressReporter<'h> {
    handler: Option<&'h mut Box<dyn ProgressHandler>>,
    direction: TransferDirection,
    total: u64,
    last_now: u64,
    hook_error: Option<String>,
}

impl<'h> ProgressReporter<'h> {
    pub(crate) fn new(
        handler: Option<&'h mut Box<dyn ProgressHandler>>,
        direction: TransferDirection,
        total: u64,
    ) -> Self {
        Self {
            handler,
            direction,
            total,
            last_now: 0,
            hook_error: None,
        }
    }

    /// Deliver a progress event. Returns `false` when the transfer must
    /// be aborted (handler request or handler panic).
    pub(crate) fn tick(&mut self, now: u64) -> bool {
        let handler = match self.handler.as_mut() {
            Some(h) => h,
            None => return true,
        };

        // Clamp counters: never decreasing, never past a known total.
        let mut now = now.max(self.last_now);
        if self.total > 0 {
            now = now.min(self.total);
        }
        self.last_now = now;

        let (dl_total, dl_now, ul_total, ul_now) = match self.direction {
            TransferDirection::Download => (self.total, now, 0, 0),
            TransferDirection::Upload => (0, 0, self.total, now),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| {
            handler.on_progress(dl_total, dl_now, ul_total, ul_now)
        })) {
            Ok(keep_going) => keep_going,
            Err(payload) => {
                let detail = panic_message(&payload);
                self.hook_error = Some(format!(
                    "error raised inside the progress callback: {}",
                    detail
                ));
                false
            }
        }
    }

    /// Error recorded from a panicking handler, if any.
    pub(crate) fn take_hook_error(&mut self) -> Option<String> {
        self.hook_error.take()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
