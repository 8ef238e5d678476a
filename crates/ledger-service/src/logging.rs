//! Log subscriber setup for binaries and front ends embedding the ledger.
//!
//! Library code only emits `tracing` events; whoever owns `main` calls
//! [`init_tracing`] once.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "info,ledger=debug";

/// Builds the filter: `RUST_LOG` when set and valid, else `default_directives`.
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=ledger_service=trace` - Trace the service layer only
/// - Default: `info`, debug for ledger crates
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_directives: Option<&str>) -> bool {
    let filter = env_filter(default_directives.unwrap_or(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing(None);
        assert!(!init_tracing(Some("warn")));
    }
}
