use tracing_subscriber::{prelude::*, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber: plain (non-ANSI) output on stderr,
/// filtered by `RUST_LOG`.
///
/// Stdout is reserved for the emitted bundle JSON.
pub fn init() {
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}
