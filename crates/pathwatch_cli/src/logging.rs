//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` takes precedence over the verbosity flags:
//!
//! ```bash
//! RUST_LOG=pathwatch=trace pathwatch '**/*.rs'
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. Stdout stays reserved for paths.
pub fn init(default_level: &str) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_level)
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_filter(filter);

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
