//! Process-wide logging setup.

/// Installs the global tracing subscriber.
///
/// Call once, before any panel code runs; a second call panics.
pub fn init() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();
}
