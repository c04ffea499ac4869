//! Diagnostic logging to stderr.
//!
//! `LDAPVI_LOG` takes a full filter directive (`ldapvi=debug`); without it the
//! level follows `-v`. `--quiet` keeps only errors.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "LDAPVI_LOG";

fn default_directive(
    verbosity: u8,
    quiet: bool,
) -> &'static str
{
    if quiet
    {
        return "error";
    }
    match verbosity
    {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Calling it again is harmless.
pub fn init(
    verbosity: u8,
    quiet: bool,
)
{
    let fallback = default_directive(verbosity, quiet);
    let filter = if quiet
    {
        EnvFilter::new(fallback)
    }
    else
    {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn verbosity_raises_level_and_quiet_wins()
    {
        assert_eq!(default_directive(0, false), "warn");
        assert_eq!(default_directive(2, false), "debug");
        assert_eq!(default_directive(9, false), "trace");
        assert_eq!(default_directive(3, true), "error");
    }

    #[test]
    fn init_twice_does_not_panic()
    {
        init(0, true);
        init(2, false);
    }
}
