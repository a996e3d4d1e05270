//! Render poller: fixed-interval observer of remote render progress.
//!
//! The poller is the sole authority for the displayed image. It never
//! replaces a frame while the service reports a render in progress; when the
//! service is idle it fetches and decodes the latest completed frame every
//! cycle, so the view tracks whatever the service last finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::panel::client::RenderService;
use crate::panel::networking::{PanelEvent, remote_error_text};

/// A decoded frame ready for GPU upload.
///
/// The pixel buffer (and the texture built from it) is the per-fetch
/// resource handle: each delivered frame replaces, and thereby releases, the
/// previous one.
#[derive(Debug)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One poll cycle: check status, and fetch the frame only when the service
/// is idle.
///
/// Failures become [`PanelEvent::PollFailed`] and never stop the loop; the
/// next cycle is the retry.
pub fn poll_once(service: &dyn RenderService) -> Vec<PanelEvent> {
    let rendering = match service.render_status() {
        Ok(rendering) => rendering,
        Err(err) => return vec![PanelEvent::PollFailed(remote_error_text(&err))],
    };

    let mut events = vec![PanelEvent::RenderStatus { rendering }];
    if rendering {
        return events;
    }

    let fetched = service
        .fetch_frame()
        .map_err(|err| remote_error_text(&err))
        .and_then(|bytes| decode_frame(&bytes));

    match fetched {
        Ok(frame) => events.push(PanelEvent::FrameReady(frame)),
        Err(text) => events.push(PanelEvent::PollFailed(text)),
    }
    events
}

fn decode_frame(bytes: &[u8]) -> Result<RgbaFrame, String> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| format!("failed to decode frame: {err}"))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(RgbaFrame {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Owns the poll thread. Started on view mount, stopped on unmount.
pub struct RenderPoller {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RenderPoller {
    pub fn spawn(
        service: Arc<dyn RenderService + Send + Sync>,
        events: mpsc::Sender<PanelEvent>,
        interval: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let thread = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                for event in poll_once(service.as_ref()) {
                    if events.send(event).is_err() {
                        return;
                    }
                }
                thread::sleep(interval);
            }
        });

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Stops the loop and joins the thread. An in-flight service call is not
    /// cancellable; this waits for the current cycle to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RenderPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::client::{ClientError, RenderRequest};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct ScriptedService {
        statuses: RefCell<VecDeque<Result<bool, ClientError>>>,
        frame_bytes: Result<Vec<u8>, ()>,
        fetches: Cell<usize>,
    }

    impl ScriptedService {
        fn new(statuses: Vec<Result<bool, ClientError>>, frame_bytes: Result<Vec<u8>, ()>) -> Self {
            Self {
                statuses: RefCell::new(statuses.into()),
                frame_bytes,
                fetches: Cell::new(0),
            }
        }
    }

    impl RenderService for ScriptedService {
        fn update_camera(&self, _request: &RenderRequest) -> Result<(), ClientError> {
            unreachable!("poller never updates the camera")
        }

        fn render_status(&self) -> Result<bool, ClientError> {
            self.statuses
                .borrow_mut()
                .pop_front()
                .expect("status script exhausted")
        }

        fn fetch_frame(&self) -> Result<Vec<u8>, ClientError> {
            self.fetches.set(self.fetches.get() + 1);
            self.frame_bytes
                .clone()
                .map_err(|()| ClientError::Body("fetch failed".into()))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("png encode");
        bytes
    }

    #[test]
    fn no_fetch_while_the_service_is_rendering() {
        let service = ScriptedService::new(vec![Ok(true), Ok(true)], Ok(png_bytes(1, 1)));

        for _ in 0..2 {
            let events = poll_once(&service);
            assert_eq!(events.len(), 1);
            assert!(matches!(
                events[0],
                PanelEvent::RenderStatus { rendering: true }
            ));
        }
        assert_eq!(service.fetches.get(), 0);
    }

    #[test]
    fn idle_cycle_fetches_and_decodes_exactly_one_frame() {
        let service = ScriptedService::new(vec![Ok(true), Ok(false)], Ok(png_bytes(2, 3)));

        // Still rendering: nothing fetched.
        poll_once(&service);
        assert_eq!(service.fetches.get(), 0);

        // Transition to idle: one fetch before the next status check.
        let events = poll_once(&service);
        assert_eq!(service.fetches.get(), 1);
        assert!(matches!(
            events[0],
            PanelEvent::RenderStatus { rendering: false }
        ));
        match &events[1] {
            PanelEvent::FrameReady(frame) => {
                assert_eq!((frame.width, frame.height), (2, 3));
                assert_eq!(frame.pixels.len(), 2 * 3 * 4);
            }
            other => panic!("expected FrameReady, got {other:?}"),
        }
    }

    #[test]
    fn status_failure_reports_and_skips_the_fetch() {
        let service = ScriptedService::new(
            vec![Err(ClientError::Body("status down".into()))],
            Ok(png_bytes(1, 1)),
        );

        let events = poll_once(&service);
        assert_eq!(events.len(), 1);
        match &events[0] {
            PanelEvent::PollFailed(text) => assert!(text.contains("status down")),
            other => panic!("expected PollFailed, got {other:?}"),
        }
        assert_eq!(service.fetches.get(), 0);
    }

    #[test]
    fn fetch_failure_still_reports_status() {
        let service = ScriptedService::new(vec![Ok(false)], Err(()));

        let events = poll_once(&service);
        assert!(matches!(
            events[0],
            PanelEvent::RenderStatus { rendering: false }
        ));
        assert!(matches!(events[1], PanelEvent::PollFailed(_)));
    }

    #[test]
    fn undecodable_frame_bytes_become_a_poll_failure() {
        let service = ScriptedService::new(vec![Ok(false)], Ok(vec![0xde, 0xad, 0xbe, 0xef]));

        let events = poll_once(&service);
        match &events[1] {
            PanelEvent::PollFailed(text) => assert!(text.contains("decode")),
            other => panic!("expected PollFailed, got {other:?}"),
        }
    }

    #[test]
    fn error_then_recovery_resumes_frame_delivery() {
        let service = ScriptedService::new(
            vec![Err(ClientError::Body("blip".into())), Ok(false)],
            Ok(png_bytes(1, 1)),
        );

        assert!(matches!(poll_once(&service)[0], PanelEvent::PollFailed(_)));

        let events = poll_once(&service);
        assert!(matches!(
            events[0],
            PanelEvent::RenderStatus { rendering: false }
        ));
        assert!(matches!(events[1], PanelEvent::FrameReady(_)));
    }
}
