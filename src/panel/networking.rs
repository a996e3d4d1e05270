//! Worker-thread plumbing between the panel and the render service.
//!
//! Network calls block, so they run off the event-loop thread and report
//! back over a channel the window shell drains each tick. Camera updates
//! and the poll loop get separate threads; the two flows overlap freely and
//! neither delays the other.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use crate::panel::client::{ClientError, RenderRequest, RenderService};
use crate::panel::poller::RgbaFrame;

/// Shown when a remote failure carries no description of its own.
pub const REMOTE_FAILURE_FALLBACK: &str = "remote render service call failed";

/// Events reported by worker threads, applied on the event-loop thread.
#[derive(Debug)]
pub enum PanelEvent {
    /// A camera-update POST was acknowledged.
    CameraAck,
    /// A camera-update POST failed; the string goes to the error slot.
    CameraFailed(String),
    /// Result of a status poll.
    RenderStatus { rendering: bool },
    /// A finished frame, decoded and ready for upload.
    FrameReady(RgbaFrame),
    /// A status or frame fetch failed; polling continues regardless.
    PollFailed(String),
}

/// User-visible text for a remote failure.
///
/// Uses the error's own description when it has one; otherwise falls back to
/// a fixed message.
pub fn remote_error_text(err: &ClientError) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        REMOTE_FAILURE_FALLBACK.to_string()
    } else {
        text
    }
}

/// Performs camera-update POSTs in queue order, one at a time.
///
/// The request sender belongs to the input coordinator; dropping the
/// coordinator closes the queue and ends the thread. An in-flight request is
/// never cancelled, its result lands whenever it settles.
pub struct UpdateWorker {
    _thread: thread::JoinHandle<()>,
}

impl UpdateWorker {
    pub fn spawn(
        service: Arc<dyn RenderService + Send + Sync>,
        events: mpsc::Sender<PanelEvent>,
    ) -> (mpsc::Sender<RenderRequest>, Self) {
        let (tx, rx) = mpsc::channel::<RenderRequest>();

        let handle = thread::spawn(move || {
            for request in rx {
                let event = match service.update_camera(&request) {
                    Ok(()) => PanelEvent::CameraAck,
                    Err(err) => PanelEvent::CameraFailed(remote_error_text(&err)),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });

        (tx, Self { _thread: handle })
    }
}
