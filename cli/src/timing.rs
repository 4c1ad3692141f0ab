//! Log level selection for the CLI.
//!
//! Diagnostics go to stderr so that `--json` output on stdout stays clean.
//! With `--timing`, every `#[instrument]`ed command and store call logs its
//! duration when its span closes.

use blog_services::config::Config;
use blog_services::telemetry;

/// Default directive when `RUST_LOG` is unset.
fn default_filter(verbose: bool, timing: bool) -> &'static str {
    if verbose {
        "debug"
    } else if timing {
        // Span close events are logged at INFO.
        "info"
    } else {
        "warn"
    }
}

pub fn init_tracing(config: &Config, verbose: bool, timing: bool) -> anyhow::Result<()> {
    telemetry::init_tracing(config, default_filter(verbose, timing), timing)
}
