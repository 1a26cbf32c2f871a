//! Diagnostic logging set-up
//!
//! Library code only emits `tracing` events. The binary installs a subscriber
//! that writes them to stderr so command output on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter (e.g. `debug` or
/// `finance_planner::storage=trace`)
pub const LOG_ENV: &str = "FINANCE_LOG";

/// Install the global subscriber.
///
/// The filter comes from [`LOG_ENV`], falling back to `default_level`, then
/// to `warn` if that does not parse. Returns false if a subscriber was
/// already installed.
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init("debug");
        assert!(!init("not a valid filter ["));
    }
}
