pub mod camera;
pub mod client;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod graphics;
pub mod networking;
pub mod poller;
pub mod timing;
pub mod user_input;
pub mod windowing;

mod sync_tests;

use thiserror::Error;

/// Fatal panel-level failures (startup only).
///
/// Remote-call failures are never fatal; they travel through
/// [`networking::PanelEvent`] and end up in the shared error slot.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("render client setup failed: {0}")]
    Client(#[from] client::ClientError),
}

pub type PanelResult<T> = Result<T, PanelError>;

pub use windowing::Windowing;
