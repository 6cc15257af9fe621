use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_DIRECTIVES: &str = "info,yatube_server=debug,sqlx=warn";

/// JSON lines on stdout. `RUST_LOG` replaces the default directives.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // a second call keeps the subscriber that is already installed
    let _ = fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .try_init();
}
