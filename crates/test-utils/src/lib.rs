//! Shared helpers for rundag's integration tests: config builders, a
//! scripted executor and a tracing setup that routes scheduler and driver
//! logs into the test harness.

pub mod builders;
pub mod scripted_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use rundag::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Filter used when `RUNDAG_LOG` is unset: scheduler and driver decisions at
/// debug, everything else only when it warns.
pub const DEFAULT_TEST_FILTER: &str = "rundag=debug,warn";

/// Upper bound for a single driver session in tests.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

fn test_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER))
}

/// Install the test subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests. Set `RUNDAG_LOG=trace` to widen it.
pub fn init_tracing() {
    INIT.call_once(|| {
        fmt()
            .with_env_filter(test_filter())
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await a session future, failing the test if it outlives [`SESSION_TIMEOUT`].
///
/// A stuck scheduler shows up as a timeout panic instead of a hung test run.
pub async fn with_timeout<F, T>(session: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(SESSION_TIMEOUT, session).await {
        Ok(value) => value,
        Err(_) => panic!("rundag session did not finish within {SESSION_TIMEOUT:?}"),
    }
}
