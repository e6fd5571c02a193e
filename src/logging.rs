//! Logging setup
//!
//! Human-readable or JSON `tracing` output on stderr, so log lines never mix
//! with the chat transcript printed on stdout.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "diagchat=debug"
    } else {
        "diagchat=info"
    }
}

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `verbose` when set.
///
/// # Errors
///
/// Returns error if the filter directive is invalid or a subscriber is
/// already installed
///
/// # Examples
///
/// ```no_run
/// use diagchat::logging::init_logging;
///
/// init_logging(false, true).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "diagchat=info");
        assert_eq!(default_directive(true), "diagchat=debug");
    }

    #[test]
    fn test_default_directives_parse() {
        assert!(EnvFilter::try_new(default_directive(false)).is_ok());
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
