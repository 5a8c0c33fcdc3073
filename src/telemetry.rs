//! Tracing setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Logs go to stderr so stdout carries only console output. `RUST_LOG`
/// overrides the default `info` filter; `json` switches to JSON lines.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one host's monitor.
    pub fn monitor(host: &str) -> Span {
        info_span!("monitor", host = %host)
    }

    /// Span for one console command.
    pub fn command(name: &str, target: Option<&str>) -> Span {
        if let Some(target) = target {
            info_span!("command", name = %name, target = %target)
        } else {
            info_span!("command", name = %name)
        }
    }
}
