//! Command-line configuration for the panel.

use std::time::Duration;

use clap::Parser;

/// Control panel for a remote ray-tracing render service.
///
/// Steer with `w s a d q e`, the arrow keys and `.`/`,`; edit exact
/// coordinates on stdin (type `help`).
#[derive(Debug, Parser)]
#[command(name = "raydeck", version)]
pub struct Config {
    /// Base URL of the render service.
    #[arg(long, default_value = "http://127.0.0.1:8080/api/raytracer")]
    pub server: String,

    /// Camera movement per key press, in scene units.
    #[arg(long, default_value_t = 0.5)]
    pub step: f64,

    /// Minimum interval between accepted key presses, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub throttle_ms: u64,

    /// Quiet period before a pending camera update fires, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,

    /// Render-status poll interval, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,
}

impl Config {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}
