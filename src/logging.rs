//! Logging setup
//!
//! Library code emits `tracing` events; the binary installs a
//! `tracing-subscriber` formatter writing to stderr so stdout stays clean
//! for piping.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter (falls back to `RUST_LOG`)
pub const LOG_ENV: &str = "SGQ_LOG";

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Build the filter: `SGQ_LOG`, then `RUST_LOG`, then the verbosity default
pub fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)))
}

/// Initialize logging for the CLI
pub fn init(verbose: bool, quiet: bool) {
    // try_init: a subscriber may already be installed when embedded
    let _ = fmt()
        .with_env_filter(filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_line_number(verbose)
        .try_init();
}

/// Initialize logging for tests
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(true, true), "debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(false, false), "warn");
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        tracing::debug!("logging initialized twice without panicking");
    }
}
