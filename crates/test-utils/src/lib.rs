pub mod builders;
pub mod fake_session;
pub mod fake_transport;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Route `tracing` output into the per-test capture buffer.
///
/// Reads `RUST_LOG`; defaults to `warn,scriptlink=debug` so failing tests
/// show the manager and session lifecycle.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,scriptlink=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Fail the test if `f` has not finished after 5 seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    match tokio::time::timeout(Duration::from_secs(5), f).await {
        Ok(value) => value,
        Err(_) => panic!("test future did not complete within 5 seconds"),
    }
}
