//! Logging setup

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

/// Initialize the global logging system.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter. Logs
/// go to stderr so they don't interleave with the chat transcript on stdout.
/// Calling this more than once is a no-op.
pub fn init_logging(level: &str) {
    INIT.get_or_init(|| {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init();
    });
}
