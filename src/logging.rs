use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};

pub const LOG_ENV: &str = "REPODASH_LOG";

/// Install the global subscriber. `REPODASH_LOG` takes precedence over the
/// verbosity counted from `-v` flags. Logs go to stderr so stdout only carries
/// rendered output.
pub fn init(verbosity: u8) {
    let fallback = match verbosity {
        0 => "info",
        1 => "repodash=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (tests) is not an error.
    let _ = registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
