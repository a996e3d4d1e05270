use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use crate::panel::PanelResult;
use crate::panel::client::{HttpRenderClient, RenderService};
use crate::panel::config::Config;
use crate::panel::console::{Console, ConsoleAction, ConsoleBackend};
use crate::panel::coordinator::InputCoordinator;
use crate::panel::graphics::FrameRenderer;
use crate::panel::networking::{PanelEvent, UpdateWorker};
use crate::panel::poller::RenderPoller;
use crate::panel::user_input::{self, InputEvent};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

const TITLE: &str = "Remote Ray Tracer";

/// Minimal winit wrapper (ApplicationHandler style).
///
/// The event loop is the single coordination point: every tick drains the
/// console and the worker channels, fires due debounce timers, and redraws.
pub struct Windowing;

impl Windowing {
    pub fn run_app(config: Config) -> PanelResult<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let service: Arc<dyn RenderService + Send + Sync> =
            Arc::new(HttpRenderClient::new(&config.server)?);

        tracing::info!("steering {}; console on stdin, type 'help'", config.server);

        let mut app = App {
            config,
            service,
            window: None,
            renderer: FrameRenderer::new(),
            console: Console::new(),
            console_backend: ConsoleBackend::new(),
            coordinator: None,
            events_rx: None,
            poller: None,
            _update_worker: None,
            rendering: false,
            last_error: None,
            current_title: String::new(),
        };

        event_loop.run_app(&mut app)?;

        Ok(())
    }
}

struct App {
    config: Config,
    service: Arc<dyn RenderService + Send + Sync>,

    window: Option<Arc<Window>>,
    renderer: FrameRenderer,
    console: Console,
    console_backend: ConsoleBackend,

    // Mounted state: present between `resumed` and `exiting`.
    coordinator: Option<InputCoordinator>,
    events_rx: Option<mpsc::Receiver<PanelEvent>>,
    poller: Option<RenderPoller>,
    _update_worker: Option<UpdateWorker>,

    rendering: bool,
    last_error: Option<String>,
    current_title: String,
}

impl App {
    /// One cooperative tick: console input, worker events, due timers.
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();

        for line in self.console.try_recv_all() {
            let Some(coordinator) = self.coordinator.as_mut() else {
                break;
            };
            let pose = coordinator.pose();
            let step = coordinator.step();
            match self.console_backend.exec(&pose, step, &line) {
                Some(ConsoleAction::EditField { field, value }) => {
                    coordinator.edit_field(field, value, now);
                }
                Some(ConsoleAction::SetStep(step)) => coordinator.set_step(step),
                Some(ConsoleAction::Quit) => event_loop.exit(),
                None => {}
            }
        }

        let events: Vec<PanelEvent> = match &self.events_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in events {
            self.apply_event(event);
        }

        if let Some(coordinator) = self.coordinator.as_mut() {
            coordinator.tick(now);
        }

        self.refresh_title();
    }

    /// Applies one worker event. The error slot is last-write-wins: any
    /// successful remote call clears it, any failure overwrites it.
    fn apply_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::CameraAck => self.last_error = None,
            PanelEvent::CameraFailed(text) => {
                tracing::warn!("camera update failed: {text}");
                self.last_error = Some(text);
            }
            PanelEvent::RenderStatus { rendering } => {
                self.rendering = rendering;
                self.last_error = None;
            }
            PanelEvent::FrameReady(frame) => {
                self.last_error = None;
                if let Err(e) = self.renderer.present_frame(&frame) {
                    tracing::warn!("frame upload failed: {e}");
                }
            }
            PanelEvent::PollFailed(text) => {
                tracing::warn!("poll failed: {text}");
                self.last_error = Some(text);
            }
        }
    }

    fn refresh_title(&mut self) {
        let mut title = String::from(TITLE);
        if self.rendering {
            title.push_str(" [rendering]");
        }
        if let Some(err) = &self.last_error {
            title.push_str(" | error: ");
            title.push_str(err);
        }

        if title != self.current_title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.current_title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs: WindowAttributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 768.0));

        let window = event_loop
            .create_window(attrs)
            .expect("failed to create window");
        let window = Arc::new(window);

        self.renderer
            .init_for_window(&window)
            .expect("renderer init failed");

        // Mount: one channel for all worker events, one worker per flow.
        let (events_tx, events_rx) = mpsc::channel::<PanelEvent>();

        let (requests_tx, update_worker) =
            UpdateWorker::spawn(self.service.clone(), events_tx.clone());
        self.coordinator = Some(InputCoordinator::new(
            self.config.step,
            self.config.throttle(),
            self.config.debounce(),
            requests_tx,
        ));
        self.poller = Some(RenderPoller::spawn(
            self.service.clone(),
            events_tx,
            self.config.poll_interval(),
        ));
        self._update_worker = Some(update_worker);
        self.events_rx = Some(events_rx);

        self.window = Some(window);

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                let now = Instant::now();
                if let Some(coordinator) = self.coordinator.as_mut() {
                    match user_input::interpret(&event) {
                        Some(InputEvent::Steer(steer)) => coordinator.key_down(steer, now),
                        Some(InputEvent::Settle) => coordinator.key_up(now),
                        None => {}
                    }
                }
            }

            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick(event_loop);

                if let Err(e) = self.renderer.draw_frame() {
                    tracing::warn!("draw failed: {e}");
                }

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Unmount: no debounced update may fire past this point, and the
        // poll interval is cancelled.
        if let Some(coordinator) = self.coordinator.as_mut() {
            coordinator.cancel_pending();
        }
        // Dropping the coordinator closes the update queue; the worker
        // finishes its in-flight request and exits.
        self.coordinator = None;
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }
}
