use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr so stdout carries only events. Level comes from
/// `RUST_LOG`, default `info`.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
