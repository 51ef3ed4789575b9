// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
// Decision trace of the extraction engine (LogObserver records).
const TRACE_FILTER: &str = "info,brd_extractor::extractors=debug";

/// Sets up the logging framework using tracing_subscriber.
/// `RUST_LOG` wins when set. Otherwise the level is `info`, and with `trace_engine`
/// every engine decision is logged at `debug` as well.
pub fn setup_logging(trace_engine: bool) {
    let fallback = if trace_engine { TRACE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout is reserved for --print output
        .init();

    tracing::debug!("Logging setup complete (fallback filter: {}).", fallback);
}
