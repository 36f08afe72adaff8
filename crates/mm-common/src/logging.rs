//! Structured Logging Configuration
//!
//! Two output shapes, selected by `LOG_FORMAT`:
//! - `json` for log aggregation (one flattened object per event)
//! - anything else for human-readable text
//!
//! Level filtering follows `RUST_LOG` and falls back to `info`, e.g.
//! `RUST_LOG=mm_matrix=debug,tower_http=info`.
//!
//! ```rust,ignore
//! mm_common::logging::init_logging("mm-server");
//! tracing::info!(group_id = %group, "Membership updated");
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "info";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Parse the value of `LOG_FORMAT`. Unknown values mean text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber for `service_name`.
///
/// Calling this twice is harmless: the second install is ignored, which keeps
/// test binaries that share a process from panicking.
pub fn init_logging(service_name: &str) {
    let format = LogFormat::from_env();

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter())
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer().with_target(true).with_ansi(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(service = service_name, ?format, "Logging initialized");
    }
}
