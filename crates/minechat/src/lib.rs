//! Shared pieces of the `minechat` and `minechat-register` binaries.

pub mod console;
pub mod settings;

use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays the chat surface. `RUST_LOG` overrides
/// the default filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minechat=info,minechat_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
