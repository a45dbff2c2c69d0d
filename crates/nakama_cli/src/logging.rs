//! Logging system setup
//!
//! Installs the global tracing subscriber. `RUST_LOG` wins over the level
//! picked from the command line.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::Args;

/// Initialize plain-text logging
///
/// # Arguments
/// * `args` - Command line arguments containing the debug flag
pub fn setup_logging(args: &Args) -> Result<()> {
    setup_logging_with_format(args, false)
}

/// Initialize logging, optionally as JSON lines
///
/// # Arguments
/// * `args` - Command line arguments containing the debug flag
/// * `json_format` - Whether to use JSON formatting
///
/// # Returns
/// * `Result<()>` - Fails when a global subscriber is already installed
pub fn setup_logging_with_format(args: &Args, json_format: bool) -> Result<()> {
    let level = if args.debug { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_setup_is_rejected() {
        let args = Args::default();
        // Other tests in this binary may have installed a subscriber first.
        let _ = setup_logging(&args);
        assert!(setup_logging(&args).is_err());
    }
}
