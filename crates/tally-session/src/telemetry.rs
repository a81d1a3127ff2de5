//! Logging setup for hosts embedding the calculator.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,tally_core=debug,tally_session=debug";

/// Installs a `tracing-subscriber` fmt subscriber.
///
/// `RUST_LOG` overrides `default_filter`. Returns `false` when a global
/// subscriber is already installed (the host's wins).
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
