use crate::util::env as env_util;
use anyhow::Context;
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Fallback filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,actix_web=info";

/// Install the global fmt subscriber shared by every binary.
///
/// `RUST_LOG` wins over `default_filter`. `LOG_SOURCE_LOCATIONS=1` adds file and
/// line to each event; `LOG_ANSI=0` disables colors for log collectors.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter {default_filter:?}"))?,
    };
    let locations = env_util::env_flag("LOG_SOURCE_LOCATIONS", false);

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(locations)
        .with_line_number(locations)
        .with_ansi(env_util::env_flag("LOG_ANSI", true))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
