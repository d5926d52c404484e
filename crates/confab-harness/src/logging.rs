//! Test logging setup.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing for a test binary. Safe to call from every test;
/// only the first call installs the subscriber. Filter via `RUST_LOG`.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::registry().with(fmt::layer().with_test_writer()).with(filter).init();
    });
}
