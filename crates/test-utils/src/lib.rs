//! Shared helpers for the `hashbuild` integration tests.
//!
//! - [`builders`]: scratch project directories and config builders
//! - [`plugins`]: small plugins with observable behaviour
//! - [`fake_executor`]: a `TaskExecutor` that records instead of building

pub mod builders;
pub mod fake_executor;
pub mod plugins;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use hashbuild::logging::{LOG_ENV, build_filter};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single drain in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured per test and only shown for failures (or with
/// `--nocapture`). `RUST_LOG` wins over `HASHBUILD_LOG`; both default to
/// `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            build_filter(None, std::env::var(LOG_ENV).ok().as_deref())
        });

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}
