//! Tracing subscriber setup.

/// Installs a `tracing_subscriber` fmt subscriber as the global default.
///
/// Calling it again (or after another subscriber was installed) is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt().with_target(true).try_init();
}
