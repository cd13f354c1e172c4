use batchreport_core::Config;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber on stderr. Human-readable in debug mode,
/// JSON lines otherwise. `-v` flags take precedence over `verbosity` in the
/// config.
pub fn init(config: &Config, verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let verbosity = if verbose > 0 { verbose } else { config.verbosity };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if config.debug {
        builder.try_init()
    } else {
        builder.json().try_init()
    };
}
