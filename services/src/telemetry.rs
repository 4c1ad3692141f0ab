use crate::config::Config;
use tracing_subscriber::{
    EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Filter used by long-running hosts when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,blog_services=debug";

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_filter`. With `span_timing`,
/// every instrumented span logs its duration when it closes.
pub fn init_tracing(config: &Config, default_filter: &str, span_timing: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let span_events = if span_timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.is_prod() {
        // Production: plain lines for the log collector, no colour codes
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_span_events(span_events)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_span_events(span_events)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
