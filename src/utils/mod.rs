//! Utilities: logging setup (verbosity flags -> tracing filter).
//!
//! Logs always go to stderr; stdout carries only the response.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Map `-v` count and `-q` to a level. Default is `warn` so a plain run
/// prints nothing but the response.
pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
    if quiet {
        return LogLevel::Error;
    }
    match verbose {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// Colour only for a terminal, and never when NO_COLOR is set.
pub fn use_ansi(is_terminal: bool, no_color: bool) -> bool {
    is_terminal && !no_color
}

/// Install the global subscriber. `RUST_LOG` wins over the flags when set.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,command_client={}", level.as_str()))
    });
    // A second init (tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi(
            std::io::stderr().is_terminal(),
            std::env::var_os("NO_COLOR").is_some(),
        ))
        .with_target(false)
        .try_init();
}
